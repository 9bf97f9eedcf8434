//! Particle flux decoding.

use super::{decode_with_layout, split_header, RecordDecoder};
use crate::error::Result;
use crate::layout::{RecordLayout, PARTICLE_FLUX_LAYOUT};
use crate::models::{DataKind, FileRecordSet};
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub struct FluxDecoder {
    layout: &'static RecordLayout,
}

impl FluxDecoder {
    pub fn new() -> Self {
        Self {
            layout: &PARTICLE_FLUX_LAYOUT,
        }
    }

    pub fn layout(&self) -> &'static RecordLayout {
        self.layout
    }
}

impl Default for FluxDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordDecoder for FluxDecoder {
    fn kind(&self) -> DataKind {
        DataKind::ParticleFlux
    }

    fn decode_text(&self, text: &str, path: &Path, source_name: &str) -> Result<FileRecordSet> {
        let (header, data) = split_header(text, self.layout.header_lines, path)?;
        let fields = decode_with_layout(self.layout, &header, &data, source_name);

        FileRecordSet::new(
            DataKind::ParticleFlux,
            path.to_path_buf(),
            source_name.to_string(),
            vec![("Layout".to_string(), self.layout.version.to_string())],
            fields,
            data.len(),
        )
    }
}
