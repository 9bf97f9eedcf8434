//! CTD pipeline tests

use super::{read_lines, HotFixture};
use crate::decoder::ctd::tests::{ctd_text, ROW_A, ROW_B};
use crate::models::DataKind;
use crate::processor::DatasetProcessor;
use crate::summary::tests::summary_row;
use std::io;
use std::sync::{Arc, Mutex};

/// Log sink shared between a test and its subscriber
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn ctd_fixture() -> HotFixture {
    let fixture = HotFixture::new("ctd");
    fixture.write_data(
        "hot-1/h01a0201.ctd",
        &ctd_text("32MW001/1", 2, 1, &[ROW_A, ROW_B]),
    );
    fixture.write_data("hot-1/h01a0601.ctd", &ctd_text("32MW001/1", 6, 1, &[ROW_A]));
    fixture.write_data("hot-1/h01a0901.ctd", &ctd_text("32MW001/1", 9, 1, &[ROW_B]));
    fixture.write_summary(
        "hot1.sum",
        &[
            summary_row("32MW001/1", 6, 1, " 110188", "shallow"),
            summary_row("32MW001/1", 2, 1, " 103188", "deep cast"),
        ],
    );
    fixture
}

#[test]
fn test_matched_casts_are_written_per_file() {
    let fixture = ctd_fixture();
    let output = fixture.output("ctd_out");

    let stats = DatasetProcessor::new(DataKind::Ctd, fixture.data_dir.clone(), output.clone())
        .unwrap()
        .quiet(true)
        .process()
        .unwrap();

    assert_eq!(stats.files_processed, 2);
    assert_eq!(stats.files_skipped, 1);
    assert_eq!(stats.rows_written, 3);
    assert_eq!(stats.unmatched_identifiers, vec!["32MW001/1.9.1"]);

    let cast = read_lines(&output.join("hot-1").join("h01a0201.csv"));
    assert_eq!(cast.len(), 3);
    assert!(cast[0].starts_with("CTDPRS,CTDTMP,CTDSAL"));
    assert!(cast[1].starts_with("     3.0, 25.1234"));
    assert!(!output.join("hot-1").join("h01a0901.csv").exists());
}

#[test]
fn test_toplevel_file_is_sorted_by_station() {
    let fixture = ctd_fixture();
    let output = fixture.output("ctd_out");

    DatasetProcessor::new(DataKind::Ctd, fixture.data_dir.clone(), output.clone())
        .unwrap()
        .quiet(true)
        .process()
        .unwrap();

    let lines = read_lines(&output.join("ctd_toplevel.dat"));
    assert_eq!(lines.len(), 4);
    assert!(lines[0].ends_with(",Year,Ship,>"));
    assert_eq!(lines[1], "XMISS,QUALT,OBS,FLUOR,CTDTMP,CTDSAL,CTDPRS,CTDOXY");
    assert!(lines[2].starts_with("001,2,1,"));
    assert!(lines[2].ends_with(",32MW001/1,hot-1/h01a0201.csv"));
    assert!(lines[3].starts_with("001,6,1,"));
}

#[test]
fn test_unmatched_cast_is_logged_in_quiet_mode() {
    let fixture = ctd_fixture();
    let output = fixture.output("ctd_out");
    let logs = LogBuffer::default();
    let sink = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || sink.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        DatasetProcessor::new(DataKind::Ctd, fixture.data_dir.clone(), output.clone())
            .unwrap()
            .quiet(true)
            .process()
            .unwrap();
    });

    let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(text.contains("WARN"));
    assert!(text.contains("32MW001/1.9.1 from file hot-1/h01a0901.ctd not found in cruise summary"));
}
