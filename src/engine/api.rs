// src/engine/api.rs
//
// Pipeline orchestration. A linear state machine with no branching back:
// decode -> interpolator select -> resample -> crop -> rotate -> encode.
// The first failing stage short-circuits; there is no partial-output state.

use crate::engine::decoder::{self, SourceImage};
use crate::engine::encoder;
use crate::engine::geometry;
use crate::engine::plan;
use crate::engine::resample;
use crate::error::Result;
use crate::options::Options;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// A finished thumbnail: encoded JPEG bytes plus the metadata tags that
/// survived the run. Failures never reach this type.
#[derive(Clone, Debug)]
pub struct Thumbnail {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub metadata: BTreeMap<String, String>,
}

impl Thumbnail {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The thumbnail engine. Holds one validated, immutable request
/// configuration; `render` can be called repeatedly and concurrently, each
/// run owning its intermediates from decode to encode.
#[derive(Clone, Debug)]
pub struct Thumbnailer {
    options: Options,
}

impl Thumbnailer {
    /// Validate the request and apply defaults. Configuration errors are
    /// rejected here, before any image bytes are touched.
    pub fn new(options: Options) -> Result<Self> {
        Ok(Self {
            options: options.normalize()?,
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Run the whole pipeline over an encoded buffer.
    pub fn render(&self, bytes: &[u8]) -> Result<Thumbnail> {
        crate::initialize();
        debug!(len = bytes.len(), "checking buffer marker");
        let source = decoder::decode(bytes)?;
        self.render_decoded(source)
    }

    /// Run pipeline steps 2-7 over an already-decoded source image.
    pub fn render_decoded(&self, source: SourceImage) -> Result<Thumbnail> {
        let options = &self.options;

        let interpolator = plan::select_interpolator(&source, options);
        let resampled = resample::resample(source, options, interpolator)?;
        let cropped = geometry::crop_to_box(resampled, options)?;
        let rotated = geometry::rotate_upright(cropped, options)?;

        info!("saving the output");
        let width = rotated.width();
        let height = rotated.height();
        let data = encoder::encode_jpeg(&rotated.pixels, options)?;

        let metadata = if options.strip {
            BTreeMap::new()
        } else {
            rotated.metadata
        };

        Ok(Thumbnail {
            data,
            width,
            height,
            metadata,
        })
    }
}

/// One-shot convenience: validate the request and render a single buffer.
pub fn thumbnail(bytes: &[u8], options: Options) -> Result<Thumbnail> {
    Thumbnailer::new(options)?.render(bytes)
}
