//! Pointer input normalization
//!
//! Mouse and touch events are reduced to one element-local point so the
//! surface never sees where an event came from.

/// Position in display units, relative to the drawing element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Top-left corner of the drawing element in client coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementRect {
    pub left: f32,
    pub top: f32,
}

/// Raw pointer payload
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    Mouse { client_x: f32, client_y: f32 },
    /// Active touch points in client coordinates; only the first is used
    Touch { touches: Vec<(f32, f32)> },
}

impl PointerInput {
    /// Element-local point, `None` for a touch event without touch points
    pub fn local_point(&self, rect: ElementRect) -> Option<Point> {
        let (x, y) = match self {
            PointerInput::Mouse { client_x, client_y } => (*client_x, *client_y),
            PointerInput::Touch { touches } => *touches.first()?,
        };
        Some(Point::new(x - rect.left, y - rect.top))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// Pointer left the element while drawing
    Leave,
}

/// Drawing command consumed by [`SignaturePad`](crate::SignaturePad)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokeCommand {
    Begin(Point),
    Extend(Point),
    End,
    Clear,
}

impl StrokeCommand {
    /// Translate a pointer event into a stroke command
    ///
    /// Leaving the element finishes the stroke the same way lifting the
    /// pointer does.
    pub fn from_pointer(
        phase: PointerPhase,
        input: &PointerInput,
        rect: ElementRect,
    ) -> Option<Self> {
        match phase {
            PointerPhase::Down => input.local_point(rect).map(StrokeCommand::Begin),
            PointerPhase::Move => input.local_point(rect).map(StrokeCommand::Extend),
            PointerPhase::Up | PointerPhase::Leave => Some(StrokeCommand::End),
        }
    }
}
