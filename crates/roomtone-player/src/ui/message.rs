//! UI messages

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum Message {
    /// "Open..." pressed
    OpenClicked,
    /// File picker closed; `None` when cancelled
    FileChosen(Option<PathBuf>),
    PlayClicked,
    StopClicked,
    RoomSizeChanged(f32),
    WetChanged(f32),
    DryChanged(f32),
    /// Position label refresh (20ms)
    PositionTick,
    /// Deliver loader results and engine changes (10ms)
    EnginePump,
}
