// src/recognition/static_classifier.rs

use super::types::{landmark, StaticGesture};
use crate::types::{HandFrame, StaticSettings};

/// Classify hand shape and pointing direction from one frame.
///
/// A fist (no extended fingers) is STOP regardless of orientation. With
/// between one and `max_extended_fingers` fingers out, the wrist→middle-tip
/// vector picks the direction. More fingers than that is an open hand and
/// yields NONE.
pub fn classify_static(frame: Option<&HandFrame>, settings: &StaticSettings) -> StaticGesture {
    let frame = match frame {
        Some(f) if f.is_complete() => f,
        _ => return StaticGesture::None,
    };

    let extended = count_extended_fingers(frame, settings.finger_threshold);

    if extended == 0 {
        StaticGesture::Stop
    } else if extended <= settings.max_extended_fingers {
        pointing_direction(frame, settings.direction_threshold)
    } else {
        StaticGesture::None
    }
}

/// Number of extended fingers (thumb included). Caller guarantees a
/// complete frame.
pub(crate) fn count_extended_fingers(frame: &HandFrame, finger_threshold: f32) -> usize {
    let fingers = landmark::FINGERS
        .iter()
        .filter(|&&(tip, pip)| frame.point(tip).y < frame.point(pip).y - finger_threshold)
        .count();

    fingers + usize::from(thumb_extended(frame, finger_threshold))
}

// Thumb extends sideways, so compare horizontal reach against the IP joint.
fn thumb_extended(frame: &HandFrame, finger_threshold: f32) -> bool {
    let tip = frame.point(landmark::THUMB_TIP);
    let ip = frame.point(landmark::THUMB_IP);
    let mcp = frame.point(landmark::THUMB_MCP);

    (tip.x - mcp.x).abs() > (ip.x - mcp.x).abs() + finger_threshold
}

fn pointing_direction(frame: &HandFrame, direction_threshold: f32) -> StaticGesture {
    let wrist = frame.point(landmark::WRIST);
    let middle_tip = frame.point(landmark::MIDDLE_TIP);
    let dx = middle_tip.x - wrist.x;
    let dy = middle_tip.y - wrist.y;

    if dx.abs() > dy.abs() {
        if dx > direction_threshold {
            StaticGesture::Right
        } else {
            StaticGesture::Left
        }
    } else if dy > direction_threshold {
        StaticGesture::Down
    } else {
        StaticGesture::Up
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::types::{HandFrame, Point};

    /// A fist: every fingertip level with its PIP, thumb tucked. The wrist
    /// sits at `(cx, cy)` and the middle tip at `(cx + dx, cy + dy)`.
    pub fn fist_at(cx: f32, cy: f32, dx: f32, dy: f32) -> HandFrame {
        let mut points = vec![Point::new(cx, cy); 21];
        for (tip, pip) in [(8, 6), (12, 10), (16, 14), (20, 18)] {
            points[pip] = Point::new(cx + dx, cy + dy);
            points[tip] = Point::new(cx + dx, cy + dy);
        }
        points[9] = Point::new(cx, cy);
        points[2] = Point::new(cx, cy);
        points[3] = Point::new(cx + 0.01, cy);
        points[4] = Point::new(cx + 0.01, cy);
        HandFrame::new(points)
    }

    /// Index finger raised well above its PIP; direction set by `(dx, dy)`.
    pub fn pointing(cx: f32, cy: f32, dx: f32, dy: f32) -> HandFrame {
        let mut frame = fist_at(cx, cy, dx, dy);
        frame.points[6] = Point::new(cx, cy);
        frame.points[8] = Point::new(cx, cy - 0.2);
        frame
    }

    /// All five fingers extended.
    pub fn open_palm(cx: f32, cy: f32) -> HandFrame {
        let mut frame = fist_at(cx, cy, 0.0, -0.3);
        for (tip, pip) in [(8, 6), (12, 10), (16, 14), (20, 18)] {
            frame.points[pip] = Point::new(cx, cy - 0.1);
            frame.points[tip] = Point::new(cx, cy - 0.3);
        }
        frame.points[4] = Point::new(cx + 0.2, cy);
        frame
    }
}
