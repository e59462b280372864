//! Frame annotation drawn directly into RGBA pixel buffers.

use image::{Rgba, RgbaImage};

use crate::geometry::FaceBox;
use crate::landmarks::Landmarks;

/// Radius of the markers on the inner-lip landmarks.
pub const LIP_MARKER_RADIUS: i32 = 3;

const LIP_MARKER_COLOR: Rgba<u8> = Rgba([0, 0, 255, 255]);
const FACE_BOX_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);

/// Mark each inner-lip landmark with a small filled circle.
pub fn mark_inner_lip(frame: &mut RgbaImage, landmarks: &Landmarks) {
    for &(x, y) in landmarks.inner_lip() {
        fill_circle(frame, x, y, LIP_MARKER_RADIUS, LIP_MARKER_COLOR);
    }
}

/// Outline a detected face box.
pub fn outline_face(frame: &mut RgbaImage, face: &FaceBox) {
    draw_rect(
        frame,
        face.x as i32,
        face.y as i32,
        face.width as i32,
        face.height as i32,
        FACE_BOX_COLOR,
    );
}

fn fill_circle(img: &mut RgbaImage, cx: i32, cy: i32, radius: i32, color: Rgba<u8>) {
    let (w, h) = img.dimensions();
    for dy in -radius..=radius {
        let y = cy + dy;
        if y < 0 || y >= h as i32 {
            continue;
        }
        for dx in -radius..=radius {
            let x = cx + dx;
            if x < 0 || x >= w as i32 {
                continue;
            }
            if dx * dx + dy * dy <= radius * radius {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

fn draw_rect(img: &mut RgbaImage, x: i32, y: i32, w: i32, h: i32, color: Rgba<u8>) {
    hline(img, x, x + w - 1, y, color);
    hline(img, x, x + w - 1, y + h - 1, color);
    vline(img, y, y + h - 1, x, color);
    vline(img, y, y + h - 1, x + w - 1, color);
}

fn hline(img: &mut RgbaImage, x0: i32, x1: i32, y: i32, color: Rgba<u8>) {
    let (w, h) = img.dimensions();
    if y < 0 || y >= h as i32 {
        return;
    }
    for x in x0.max(0)..=x1.min(w as i32 - 1) {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn vline(img: &mut RgbaImage, y0: i32, y1: i32, x: i32, color: Rgba<u8>) {
    let (w, h) = img.dimensions();
    if x < 0 || x >= w as i32 {
        return;
    }
    for y in y0.max(0)..=y1.min(h as i32 - 1) {
        img.put_pixel(x as u32, y as u32, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{INNER_LIP, LANDMARK_COUNT};

    #[test]
    fn lip_markers_land_on_the_inner_lip_points() {
        let mut frame = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));

        let mut points = [(0, 0); LANDMARK_COUNT];
        for (i, idx) in INNER_LIP.enumerate() {
            points[idx] = (20 + 8 * i as i32, 50);
        }
        let lm = Landmarks::new(points);

        mark_inner_lip(&mut frame, &lm);

        for &(x, y) in lm.inner_lip() {
            assert_eq!(*frame.get_pixel(x as u32, y as u32), LIP_MARKER_COLOR);
        }
        // Only the inner-lip points are marked; landmark 0 at (0, 0) is not.
        assert_eq!(*frame.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn markers_clip_at_the_frame_border() {
        let mut frame = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));

        let mut points = [(50, 50); LANDMARK_COUNT];
        points[60] = (0, 0);
        points[61] = (-2, 5);
        points[62] = (9, 9);
        let lm = Landmarks::new(points);

        mark_inner_lip(&mut frame, &lm);
        assert_eq!(*frame.get_pixel(0, 0), LIP_MARKER_COLOR);
        assert_eq!(*frame.get_pixel(0, 5), LIP_MARKER_COLOR);
        assert_eq!(*frame.get_pixel(9, 9), LIP_MARKER_COLOR);
    }

    #[test]
    fn face_outline_traces_the_box_edges() {
        let mut frame = RgbaImage::from_pixel(50, 50, Rgba([0, 0, 0, 255]));
        let face = FaceBox::new(10.0, 10.0, 20.0, 15.0);

        outline_face(&mut frame, &face);

        assert_eq!(*frame.get_pixel(10, 10), FACE_BOX_COLOR);
        assert_eq!(*frame.get_pixel(29, 24), FACE_BOX_COLOR);
        assert_eq!(*frame.get_pixel(15, 10), FACE_BOX_COLOR);
        assert_eq!(*frame.get_pixel(15, 15), Rgba([0, 0, 0, 255]));
    }
}
