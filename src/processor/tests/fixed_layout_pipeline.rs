//! Particle flux and primary production pipeline tests

use super::{cell, read_lines, HotFixture};
use crate::config::{OutputFormat, PipelineConfig};
use crate::decoder::flux::tests::{flux_line, FLUX_HEADER};
use crate::decoder::prim_prod::tests::{pp_line, PP_HEADER};
use crate::models::DataKind;
use crate::processor::DatasetProcessor;
use std::fs;

fn flux_fixture() -> HotFixture {
    let fixture = HotFixture::new("flux");
    fixture.write_data(
        "hot2.flux",
        &format!(
            "{}{}\n{}\n",
            FLUX_HEADER,
            flux_line(2, 300, 'C', "0.91"),
            flux_line(2, 150, 'C', "1.40")
        ),
    );
    fixture.write_data(
        "trap/hot1.flux",
        &format!("{}{}\n", FLUX_HEADER, flux_line(1, 150, 'P', "1.23")),
    );
    fixture
}

#[test]
fn test_flux_files_are_combined_without_summaries() {
    let fixture = flux_fixture();
    let output = fixture.output("flux.csv");

    let stats = DatasetProcessor::new(DataKind::ParticleFlux, fixture.data_dir.clone(), output.clone())
        .unwrap()
        .quiet(true)
        .process()
        .unwrap();

    assert_eq!(stats.files_processed, 2);
    assert_eq!(stats.rows_written, 3);
    assert!(stats.unmatched_identifiers.is_empty());

    let lines = read_lines(&output);
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("P_flux_filename,Cruise,Depth,Treatment,Carbon"));
    assert!(lines[0].ends_with(",PIC_n,lon,lat"));
    assert!(lines[1].starts_with("trap/hot1.flux,   1,150,P,"));
    assert!(lines[1].ends_with(",-158.00,22.75"));
    assert_eq!(cell(&lines[0], &lines[2], "Depth"), "150");
    assert_eq!(cell(&lines[0], &lines[3], "Depth"), "300");
}

#[test]
fn test_short_flux_line_writes_empty_fields() {
    let fixture = HotFixture::new("flux");
    fixture.write_data(
        "hot1.flux",
        &format!("{}{:>4}    {:>3}   {}   {:>5}\n", FLUX_HEADER, 1, 150, 'C', "1.23"),
    );
    let output = fixture.output("flux.csv");

    let stats = DatasetProcessor::new(DataKind::ParticleFlux, fixture.data_dir.clone(), output.clone())
        .unwrap()
        .quiet(true)
        .process()
        .unwrap();

    assert_eq!(stats.rows_written, 1);
    let text = fs::read_to_string(&output).unwrap();
    assert!(!text.contains("\"\""));
    let lines = read_lines(&output);
    assert_eq!(cell(&lines[0], &lines[1], "Carbon"), " 1.23");
    assert_eq!(cell(&lines[0], &lines[1], "PIC_n"), "");
    assert!(lines[1].ends_with(",,-158.00,22.75"));
}

#[test]
fn test_flux_parquet_output() {
    let fixture = flux_fixture();
    let output = fixture.output("flux.parquet");
    let config = PipelineConfig::for_kind(DataKind::ParticleFlux).with_output_format(OutputFormat::Parquet);

    let stats = DatasetProcessor::new(DataKind::ParticleFlux, fixture.data_dir.clone(), output.clone())
        .unwrap()
        .with_config(config)
        .quiet(true)
        .process()
        .unwrap();

    assert_eq!(stats.rows_written, 3);
    assert!(fs::metadata(&output).unwrap().len() > 0);
}

#[test]
fn test_prim_prod_date_times_and_order() {
    let fixture = HotFixture::new("pp");
    fixture.write_data(
        "hot101.pp",
        &format!(
            "{}\n{}\n",
            PP_HEADER,
            pp_line(101, "180101", "0630", "0830", "25")
        ),
    );
    fixture.write_data(
        "hot100.pp",
        &format!(
            "{}\n{}\n",
            PP_HEADER,
            pp_line(100, "171231", "2430", "-9", "5")
        ),
    );
    let output = fixture.output("prim_prod.csv");

    let stats = DatasetProcessor::new(DataKind::PrimaryProduction, fixture.data_dir.clone(), output.clone())
        .unwrap()
        .quiet(true)
        .process()
        .unwrap();

    assert_eq!(stats.rows_written, 2);
    let lines = read_lines(&output);
    assert_eq!(lines.len(), 3);
    assert_eq!(cell(&lines[0], &lines[1], "Cruise"), "  100");
    assert_eq!(cell(&lines[0], &lines[1], "start_date_time"), "2018-01-01T00:30:00");
    assert_eq!(cell(&lines[0], &lines[1], "end_date_time"), "-9");
    assert_eq!(cell(&lines[0], &lines[2], "start_date_time"), "2018-01-01T06:30:00");
    assert_eq!(cell(&lines[0], &lines[2], "lat"), "22.75");
}
