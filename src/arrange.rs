//! Pointer-driven drag and corner-resize for framed elements.
//!
//! A [`Tracker`] is a small state machine over one collection: idle, dragging
//! element `i`, or resizing element `i` from a corner. The dashboard owns two
//! of them (stream slots and chat windows) and feeds every pointer-move and
//! pointer-up to both; an idle tracker ignores the event.
//!
//! Trackers store indices, not references. Pointer-down validates the index;
//! later events re-check it against the collection so a tracker left pointing
//! past the end (element closed mid-drag) does nothing.

use serde::{Deserialize, Serialize};

use crate::layout::{bound, ClampPolicy, Frame, Point, Size, CANVAS_LIMIT};

/// Anything with an on-screen frame the engine can move and resize.
pub trait Framed {
    fn frame(&self) -> Frame;
    fn set_frame(&mut self, frame: Frame);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Corner {
    Nw,
    Ne,
    Sw,
    Se,
}

impl Corner {
    /// Sign applied to the pointer delta for (width, height). A negative sign
    /// means the corner sits on the leading edge: growing the frame moves its
    /// origin.
    fn signs(self) -> (f64, f64) {
        match self {
            Corner::Se => (1.0, 1.0),
            Corner::Sw => (-1.0, 1.0),
            Corner::Ne => (1.0, -1.0),
            Corner::Nw => (-1.0, -1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Drag {
        index: usize,
        offset: Point,
    },
    Resize {
        index: usize,
        corner: Corner,
        start_pointer: Point,
        start_frame: Frame,
    },
}

/// Drag/resize state machine for one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracker {
    min_size: Size,
    policy: ClampPolicy,
    gesture: Option<Gesture>,
}

impl Tracker {
    pub fn new(min_size: Size, policy: ClampPolicy) -> Self {
        Self {
            min_size,
            policy,
            gesture: None,
        }
    }

    pub fn min_size(&self) -> Size {
        self.min_size
    }

    pub fn is_idle(&self) -> bool {
        self.gesture.is_none()
    }

    pub fn dragging(&self) -> Option<usize> {
        match self.gesture {
            Some(Gesture::Drag { index, .. }) => Some(index),
            _ => None,
        }
    }

    pub fn resizing(&self) -> Option<(usize, Corner)> {
        match self.gesture {
            Some(Gesture::Resize { index, corner, .. }) => Some((index, corner)),
            _ => None,
        }
    }

    /// Pointer pressed on element `index`'s drag handle.
    pub fn begin_drag<T: Framed>(&mut self, items: &[T], index: usize, pointer: Point) -> bool {
        let Some(item) = items.get(index) else {
            return false;
        };
        let origin = item.frame().origin;
        self.gesture = Some(Gesture::Drag {
            index,
            offset: pointer - origin,
        });
        true
    }

    /// Pointer pressed on one of element `index`'s corner handles.
    pub fn begin_resize<T: Framed>(
        &mut self,
        items: &[T],
        index: usize,
        corner: Corner,
        pointer: Point,
    ) -> bool {
        let Some(item) = items.get(index) else {
            return false;
        };
        self.gesture = Some(Gesture::Resize {
            index,
            corner,
            start_pointer: pointer,
            start_frame: item.frame(),
        });
        true
    }

    /// Apply a pointer move to the tracked element. Returns true when a
    /// frame changed.
    pub fn pointer_move<T: Framed>(&self, items: &mut [T], pointer: Point) -> bool {
        match self.gesture {
            None => false,
            Some(Gesture::Drag { index, offset }) => {
                let Some(item) = items.get_mut(index) else {
                    return false;
                };
                let mut frame = item.frame();
                frame.origin = drag_origin(pointer, offset);
                item.set_frame(frame);
                true
            }
            Some(Gesture::Resize {
                index,
                corner,
                start_pointer,
                start_frame,
            }) => {
                let Some(item) = items.get_mut(index) else {
                    return false;
                };
                let delta = pointer - start_pointer;
                item.set_frame(resize_frame(
                    start_frame,
                    corner,
                    delta,
                    self.min_size,
                    self.policy,
                ));
                true
            }
        }
    }

    /// Pointer released anywhere.
    pub fn pointer_up(&mut self) {
        self.gesture = None;
    }

    /// Forget the gesture if it targets `index`, and shift a gesture on a
    /// later element down by one. Call after removing element `index`.
    pub fn on_removed(&mut self, removed: usize) {
        let target = match &mut self.gesture {
            Some(Gesture::Drag { index, .. }) | Some(Gesture::Resize { index, .. }) => index,
            None => return,
        };
        if *target == removed {
            self.gesture = None;
        } else if *target > removed {
            *target -= 1;
        }
    }
}

/// New top-left for a drag: pointer minus grab offset, never negative and
/// never past the canvas limit.
pub fn drag_origin(pointer: Point, offset: Point) -> Point {
    let p = pointer - offset;
    Point::new(bound(p.x, 0.0, CANVAS_LIMIT), bound(p.y, 0.0, CANVAS_LIMIT))
}

/// Frame after dragging `corner` by `delta` from `start`.
pub fn resize_frame(
    start: Frame,
    corner: Corner,
    delta: Point,
    min: Size,
    policy: ClampPolicy,
) -> Frame {
    let (sx, sy) = corner.signs();
    let width = (start.size.width + sx * delta.x).max(min.width);
    let height = (start.size.height + sy * delta.y).max(min.height);

    let shift = |leading: bool, raw: f64, absorbed: f64| -> f64 {
        if !leading {
            return 0.0;
        }
        match policy {
            ClampPolicy::ShiftByRawDelta => raw,
            ClampPolicy::AnchorOppositeEdge => absorbed,
        }
    };
    let x = start.origin.x + shift(sx < 0.0, delta.x, start.size.width - width);
    let y = start.origin.y + shift(sy < 0.0, delta.y, start.size.height - height);

    Frame::new(x, y, width, height).bounded(min)
}
