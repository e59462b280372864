//! Reader for dlib's serialized shape_predictor format.
//!
//! Parses the binary `.dat` layout the published landmark models ship in,
//! with transparent bzip2 decompression for `.dat.bz2` files. The format is
//! dlib's generic serialization: integers are variable-length (control byte
//! holds the sign bit and payload byte count, payload is little-endian),
//! floats are (mantissa, exponent) integer pairs, and matrices store their
//! dimensions negated ahead of the element floats.
//!
//! Pretrained models come from the dlib-models repository:
//!
//! ```bash
//! git clone --depth 1 https://github.com/davisking/dlib-models
//! bunzip2 dlib-models/shape_predictor_68_face_landmarks.dat.bz2
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use bzip2::read::BzDecoder;
use log::debug;

use crate::cascade::{CascadeStage, RegressionTree, Split};
use crate::error::{Error, Result};
use crate::geometry::{Point, Shape};
use crate::predictor::ShapePredictor;

struct DatReader<R: Read> {
    source: R,
}

impl<R: Read> DatReader<R> {
    fn new(source: R) -> Self {
        Self { source }
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.source.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Decode a variable-length integer.
    fn read_int(&mut self) -> Result<i64> {
        let control = self.read_byte()?;
        let negative = control & 0x80 != 0;
        let len = (control & 0x0F) as usize;
        if len > 8 {
            return Err(Error::InvalidModel(format!(
                "varint claims {} payload bytes",
                len
            )));
        }

        let mut value: u64 = 0;
        for i in 0..len {
            value |= u64::from(self.read_byte()?) << (8 * i);
        }

        let value = value as i64;
        Ok(if negative { -value } else { value })
    }

    fn read_ulong(&mut self) -> Result<u64> {
        let value = self.read_int()?;
        if value < 0 {
            return Err(Error::InvalidModel(format!(
                "expected unsigned value, found {}",
                value
            )));
        }
        Ok(value as u64)
    }

    /// Decode a float stored as a (mantissa, exponent) pair.
    fn read_f32(&mut self) -> Result<f32> {
        let mantissa = self.read_int()?;
        let exponent = self.read_int()? as i32;
        if mantissa == 0 {
            return Ok(0.0);
        }
        Ok(((mantissa as f64) * 2.0f64.powi(exponent)) as f32)
    }

    /// Read a column matrix of interleaved (x, y) floats as a shape.
    ///
    /// Newer dlib releases serialize matrix dimensions negated; older files
    /// carry them as-is, so only the magnitude counts.
    fn read_points(&mut self) -> Result<Shape> {
        let rows = self.read_int()?.unsigned_abs();
        let cols = self.read_int()?.unsigned_abs();
        if cols != 1 || rows < 2 || rows % 2 != 0 {
            return Err(Error::InvalidModel(format!(
                "bad point matrix dimensions {}x{}",
                rows, cols
            )));
        }

        let mut coords = Vec::with_capacity(rows as usize);
        for _ in 0..rows {
            coords.push(self.read_f32()?);
        }
        Ok(Shape::from_interleaved(&coords))
    }
}

/// Load a shape predictor from a `.dat` or `.dat.bz2` file.
pub fn load_dat<P: AsRef<Path>>(path: P) -> Result<ShapePredictor> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let model = if path.extension().is_some_and(|ext| ext == "bz2") {
        read_predictor(BzDecoder::new(reader))
    } else {
        read_predictor(reader)
    }?;

    debug!(
        "loaded {}: {} landmarks, {} cascade stages",
        path.display(),
        model.landmark_count(),
        model.stage_count()
    );
    Ok(model)
}

/// Parse a dlib-serialized shape predictor from any byte source.
pub fn read_predictor<R: Read>(source: R) -> Result<ShapePredictor> {
    let mut r = DatReader::new(source);

    let version = r.read_int()?;
    if version != 1 {
        return Err(Error::InvalidModel(format!(
            "unsupported shape predictor version {}",
            version
        )));
    }

    let mean_shape = r.read_points()?;
    let landmarks = mean_shape.len();

    // Forests: per stage, a list of trees, each as splits then leaves.
    let stage_count = r.read_ulong()? as usize;
    let mut forests = Vec::with_capacity(stage_count);
    for _ in 0..stage_count {
        let tree_count = r.read_ulong()? as usize;
        let mut trees = Vec::with_capacity(tree_count);
        for _ in 0..tree_count {
            trees.push(read_tree(&mut r, landmarks)?);
        }
        forests.push(trees);
    }

    // Anchor tables: per stage, the landmark index behind each feature.
    let anchor_stages = r.read_ulong()? as usize;
    let mut anchor_tables = Vec::with_capacity(anchor_stages);
    for _ in 0..anchor_stages {
        let count = r.read_ulong()? as usize;
        let mut anchors = Vec::with_capacity(count);
        for _ in 0..count {
            anchors.push(r.read_ulong()? as u32);
        }
        anchor_tables.push(anchors);
    }

    // Offset tables: per stage, each feature's displacement from its anchor.
    let offset_stages = r.read_ulong()? as usize;
    let mut offset_tables = Vec::with_capacity(offset_stages);
    for _ in 0..offset_stages {
        let count = r.read_ulong()? as usize;
        let mut offsets = Vec::with_capacity(count);
        for _ in 0..count {
            let dx = r.read_f32()?;
            let dy = r.read_f32()?;
            offsets.push(Point::new(dx, dy));
        }
        offset_tables.push(offsets);
    }

    if anchor_tables.len() != forests.len() || offset_tables.len() != forests.len() {
        return Err(Error::InvalidModel(format!(
            "stage tables disagree: {} forests, {} anchor tables, {} offset tables",
            forests.len(),
            anchor_tables.len(),
            offset_tables.len()
        )));
    }

    let stages = forests
        .into_iter()
        .zip(anchor_tables)
        .zip(offset_tables)
        .map(|((trees, anchors), offsets)| CascadeStage {
            trees,
            anchors,
            offsets,
        })
        .collect();

    ShapePredictor::new(mean_shape, stages)
}

fn read_tree<R: Read>(r: &mut DatReader<R>, landmarks: usize) -> Result<RegressionTree> {
    let split_count = r.read_ulong()? as usize;
    let mut splits = Vec::with_capacity(split_count);
    for _ in 0..split_count {
        let idx1 = r.read_ulong()? as u32;
        let idx2 = r.read_ulong()? as u32;
        let threshold = r.read_f32()?;
        splits.push(Split {
            idx1,
            idx2,
            threshold,
        });
    }

    let leaf_count = r.read_ulong()? as usize;
    if leaf_count != split_count + 1 {
        return Err(Error::InvalidModel(format!(
            "tree with {} splits must carry {} leaves, found {}",
            split_count,
            split_count + 1,
            leaf_count
        )));
    }

    let mut leaves = Vec::with_capacity(leaf_count);
    for _ in 0..leaf_count {
        let leaf = r.read_points()?;
        if leaf.len() != landmarks {
            return Err(Error::InvalidModel(format!(
                "leaf delta has {} points, expected {}",
                leaf.len(),
                landmarks
            )));
        }
        leaves.push(leaf);
    }

    Ok(RegressionTree { splits, leaves })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn push_int(buf: &mut Vec<u8>, value: i64) {
        if value == 0 {
            buf.push(0);
            return;
        }
        let negative = value < 0;
        let mut magnitude = value.unsigned_abs();

        let mut payload = Vec::new();
        while magnitude != 0 {
            payload.push((magnitude & 0xFF) as u8);
            magnitude >>= 8;
        }

        let control = if negative { 0x80 } else { 0x00 } | payload.len() as u8;
        buf.push(control);
        buf.extend_from_slice(&payload);
    }

    // Test values are dyadic rationals, so halving the fraction terminates.
    fn push_f32(buf: &mut Vec<u8>, value: f32) {
        let mut mantissa = f64::from(value);
        let mut exponent = 0i64;
        while mantissa.fract() != 0.0 {
            mantissa *= 2.0;
            exponent -= 1;
        }
        push_int(buf, mantissa as i64);
        push_int(buf, exponent);
    }

    fn push_points(buf: &mut Vec<u8>, coords: &[f32]) {
        push_int(buf, -(coords.len() as i64));
        push_int(buf, -1);
        for &c in coords {
            push_f32(buf, c);
        }
    }

    /// A two-landmark predictor: one stage, one tree with a single split.
    fn tiny_model_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        push_int(&mut buf, 1); // version

        push_points(&mut buf, &[0.25, 0.5, 0.75, 0.5]); // mean shape

        push_int(&mut buf, 1); // stages
        push_int(&mut buf, 1); // trees in stage 0

        push_int(&mut buf, 1); // splits
        push_int(&mut buf, 0); // idx1
        push_int(&mut buf, 1); // idx2
        push_f32(&mut buf, 0.0); // threshold
        push_int(&mut buf, 2); // leaves
        push_points(&mut buf, &[0.125, 0.0, 0.0, 0.0]);
        push_points(&mut buf, &[-0.125, 0.0, 0.0, 0.0]);

        push_int(&mut buf, 1); // anchor tables
        push_int(&mut buf, 2);
        push_int(&mut buf, 0);
        push_int(&mut buf, 1);

        push_int(&mut buf, 1); // offset tables
        push_int(&mut buf, 2);
        push_f32(&mut buf, 0.0);
        push_f32(&mut buf, 0.0);
        push_f32(&mut buf, 0.0);
        push_f32(&mut buf, 0.0);

        buf
    }

    #[test]
    fn varint_round_trip() {
        let values = [0i64, 1, 127, 255, 256, 65535, 65536, -1, -300, 1 << 40];
        let mut buf = Vec::new();
        for &v in &values {
            push_int(&mut buf, v);
        }

        let mut reader = DatReader::new(Cursor::new(buf));
        for &v in &values {
            assert_eq!(reader.read_int().unwrap(), v);
        }
    }

    #[test]
    fn ulong_rejects_negative() {
        let mut buf = Vec::new();
        push_int(&mut buf, -5);
        let mut reader = DatReader::new(Cursor::new(buf));
        assert!(matches!(
            reader.read_ulong(),
            Err(Error::InvalidModel(_))
        ));
    }

    #[test]
    fn float_decoding() {
        let values = [0.0f32, 1.0, -1.0, 0.5, 0.25, -1.5, 3.0];
        let mut buf = Vec::new();
        for &v in &values {
            push_f32(&mut buf, v);
        }

        let mut reader = DatReader::new(Cursor::new(buf));
        for &v in &values {
            assert!((reader.read_f32().unwrap() - v).abs() < 1e-6);
        }
    }

    #[test]
    fn parses_synthetic_model() {
        let model = read_predictor(Cursor::new(tiny_model_bytes())).unwrap();

        assert_eq!(model.landmark_count(), 2);
        assert_eq!(model.stage_count(), 1);

        let stage = &model.stages()[0];
        assert_eq!(stage.feature_count(), 2);
        assert_eq!(stage.anchors, vec![0, 1]);
        assert_eq!(stage.trees.len(), 1);
        assert_eq!(stage.trees[0].splits.len(), 1);
        assert_eq!(stage.trees[0].leaves.len(), 2);
        assert!((stage.trees[0].leaves[0][0].x - 0.125).abs() < 1e-6);

        let mean = model.mean_shape();
        assert!((mean[0].x - 0.25).abs() < 1e-6);
        assert!((mean[1].x - 0.75).abs() < 1e-6);
    }

    #[test]
    fn rejects_unknown_version() {
        let mut buf = Vec::new();
        push_int(&mut buf, 2);
        assert!(matches!(
            read_predictor(Cursor::new(buf)),
            Err(Error::InvalidModel(_))
        ));
    }

    #[test]
    fn truncated_input_is_an_error() {
        let bytes = tiny_model_bytes();
        let cut = &bytes[..bytes.len() / 2];
        assert!(read_predictor(Cursor::new(cut)).is_err());
    }

    #[test]
    fn bad_matrix_dimensions_are_an_error() {
        let mut buf = Vec::new();
        push_int(&mut buf, 1); // version
        push_int(&mut buf, -3); // 3 rows: not a point list
        push_int(&mut buf, -1);
        assert!(matches!(
            read_predictor(Cursor::new(buf)),
            Err(Error::InvalidModel(_))
        ));
    }
}
