#![allow(dead_code)]

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_backend::{BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingErrorKind};
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

/// Comparable copy of a `BackendColor`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Paint {
    pub alpha: f64,
    pub rgb: (u8, u8, u8),
}

impl From<BackendColor> for Paint {
    fn from(c: BackendColor) -> Paint {
        Paint { alpha: c.alpha, rgb: c.rgb }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Rect {
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        color: Paint,
        fill: bool,
    },
    Circle {
        center: BackendCoord,
        radius: u32,
        color: Paint,
        fill: bool,
    },
    Polygon {
        vertices: Vec<BackendCoord>,
        color: Paint,
    },
    Path {
        points: Vec<BackendCoord>,
        color: Paint,
    },
    Text {
        text: String,
        pos: BackendCoord,
        color: Paint,
    },
}

#[derive(Debug, Default)]
pub struct Recording {
    pub ops: Vec<Op>,
    pub pixels: HashMap<BackendCoord, Paint>,
}

impl Recording {
    pub fn circles(&self) -> Vec<(BackendCoord, u32, Paint, bool)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Circle { center, radius, color, fill } => Some((*center, *radius, *color, *fill)),
                _ => None,
            })
            .collect()
    }

    pub fn polygons(&self) -> Vec<&Vec<BackendCoord>> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Polygon { vertices, .. } => Some(vertices),
                _ => None,
            })
            .collect()
    }

    pub fn filled_rects(&self) -> Vec<(BackendCoord, BackendCoord, Paint)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Rect {
                    upper_left,
                    bottom_right,
                    color,
                    fill: true,
                } => Some((*upper_left, *bottom_right, *color)),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<(String, BackendCoord)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Text { text, pos, .. } => Some((text.clone(), *pos)),
                _ => None,
            })
            .collect()
    }
}

/// Vector backend that records draw calls instead of rasterizing; text is
/// recorded without touching any font.
pub struct RecordingBackend {
    size: (u32, u32),
    recording: Rc<RefCell<Recording>>,
}

impl RecordingBackend {
    pub fn new(size: (u32, u32)) -> (RecordingBackend, Rc<RefCell<Recording>>) {
        let recording = Rc::new(RefCell::new(Recording::default()));
        let backend = RecordingBackend {
            size,
            recording: Rc::clone(&recording),
        };
        (backend, recording)
    }

    pub fn area(size: (u32, u32)) -> (DrawingArea<RecordingBackend, Shift>, Rc<RefCell<Recording>>) {
        let (backend, recording) = RecordingBackend::new(size);
        (backend.into_drawing_area(), recording)
    }

    fn push(&mut self, op: Op) {
        self.recording.borrow_mut().ops.push(op);
    }
}

impl DrawingBackend for RecordingBackend {
    type ErrorType = Infallible;

    fn get_size(&self) -> (u32, u32) {
        self.size
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Infallible>> {
        Ok(())
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Infallible>> {
        Ok(())
    }

    fn draw_pixel(&mut self, point: BackendCoord, color: BackendColor) -> Result<(), DrawingErrorKind<Infallible>> {
        self.recording.borrow_mut().pixels.insert(point, color.into());
        Ok(())
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Infallible>> {
        self.push(Op::Rect {
            upper_left,
            bottom_right,
            color: style.color().into(),
            fill,
        });
        Ok(())
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(&mut self, path: I, style: &S) -> Result<(), DrawingErrorKind<Infallible>> {
        self.push(Op::Path {
            points: path.into_iter().collect(),
            color: style.color().into(),
        });
        Ok(())
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Infallible>> {
        self.push(Op::Circle {
            center,
            radius,
            color: style.color().into(),
            fill,
        });
        Ok(())
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(&mut self, vert: I, style: &S) -> Result<(), DrawingErrorKind<Infallible>> {
        self.push(Op::Polygon {
            vertices: vert.into_iter().collect(),
            color: style.color().into(),
        });
        Ok(())
    }

    fn draw_text<TStyle: BackendTextStyle>(&mut self, text: &str, style: &TStyle, pos: BackendCoord) -> Result<(), DrawingErrorKind<Infallible>> {
        self.push(Op::Text {
            text: text.to_string(),
            pos,
            color: style.color().into(),
        });
        Ok(())
    }
}
