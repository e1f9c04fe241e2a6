// Translation of raw egui input into editor commands.

use egui::{Event, Key, Modifiers, PointerButton, Pos2, Rect};
use tracing::trace;

use super::canvas::CanvasView;

/// Keyboard-triggered commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Undo,
    Redo,
    ExportPng,
    ToggleEraser,
}

/// Editor-level input after pointer positions have been mapped to cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    /// Primary button pressed over a cell.
    Down { x: i32, y: i32 },
    Move { x: i32, y: i32 },
    Up,
    /// Pointer left the canvas.
    Leave,
    /// Secondary button: eyedropper.
    Pick { x: i32, y: i32 },
    /// Pinch gesture with egui's multiplicative zoom factor.
    Zoom(f32),
    Action(Action),
}

/// Key binding lookup. Ctrl and Cmd are interchangeable.
pub fn shortcut(key: Key, modifiers: Modifiers) -> Option<Action> {
    let command = modifiers.command || modifiers.ctrl || modifiers.mac_cmd;
    match (key, command, modifiers.shift) {
        (Key::Z, true, false) => Some(Action::Undo),
        (Key::Z, true, true) => Some(Action::Redo),
        (Key::E, true, _) => Some(Action::ExportPng),
        (Key::E, false, false) if !modifiers.alt => Some(Action::ToggleEraser),
        _ => None,
    }
}

/// Map one egui event. `rect` is where the surface is displayed on screen.
/// Events the editor does not react to map to `None`.
pub fn translate(event: &Event, view: &CanvasView, rect: Rect) -> Option<Input> {
    let cell = |pos: Pos2| view.cell_at(rect, pos);
    let input = match event {
        Event::PointerButton {
            pos,
            button: PointerButton::Primary,
            pressed: true,
            ..
        } => {
            if !rect.contains(*pos) {
                return None;
            }
            let (x, y) = cell(*pos);
            Input::Down { x, y }
        }
        Event::PointerButton {
            button: PointerButton::Primary,
            pressed: false,
            ..
        } => Input::Up,
        Event::PointerButton {
            pos,
            button: PointerButton::Secondary,
            pressed: true,
            ..
        } => {
            if !rect.contains(*pos) {
                return None;
            }
            let (x, y) = cell(*pos);
            Input::Pick { x, y }
        }
        Event::PointerMoved(pos) => {
            if !rect.contains(*pos) {
                Input::Leave
            } else {
                let (x, y) = cell(*pos);
                Input::Move { x, y }
            }
        }
        Event::PointerGone => Input::Leave,
        Event::Zoom(factor) => Input::Zoom(*factor),
        Event::Key {
            key,
            pressed: true,
            repeat: false,
            modifiers,
            ..
        } => Input::Action(shortcut(*key, *modifiers)?),
        _ => return None,
    };
    trace!(?input, "input translated");
    Some(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minedraw_core::Dimensions;

    fn ctrl() -> Modifiers {
        Modifiers {
            ctrl: true,
            command: true,
            ..Default::default()
        }
    }

    fn key(key: Key, modifiers: Modifiers) -> Event {
        Event::Key {
            key,
            physical_key: None,
            pressed: true,
            repeat: false,
            modifiers,
        }
    }

    fn setup() -> (CanvasView, Rect) {
        let view = CanvasView::new(Dimensions::new(10, 10), 16);
        let rect = view.display_rect(Pos2::new(20.0, 20.0));
        (view, rect)
    }

    #[test]
    fn test_shortcuts() {
        assert_eq!(shortcut(Key::Z, ctrl()), Some(Action::Undo));
        assert_eq!(
            shortcut(Key::Z, Modifiers { shift: true, ..ctrl() }),
            Some(Action::Redo)
        );
        assert_eq!(shortcut(Key::E, ctrl()), Some(Action::ExportPng));
        assert_eq!(shortcut(Key::E, Modifiers::NONE), Some(Action::ToggleEraser));
        assert_eq!(shortcut(Key::Z, Modifiers::NONE), None);
        let cmd = Modifiers {
            mac_cmd: true,
            command: true,
            ..Default::default()
        };
        assert_eq!(shortcut(Key::Z, cmd), Some(Action::Undo));
    }

    #[test]
    fn test_pointer_events() {
        let (view, rect) = setup();
        let down = Event::PointerButton {
            pos: Pos2::new(20.0 + 33.0, 20.0 + 1.0),
            button: PointerButton::Primary,
            pressed: true,
            modifiers: Modifiers::NONE,
        };
        assert_eq!(translate(&down, &view, rect), Some(Input::Down { x: 2, y: 0 }));

        let pick = Event::PointerButton {
            pos: Pos2::new(21.0, 21.0),
            button: PointerButton::Secondary,
            pressed: true,
            modifiers: Modifiers::NONE,
        };
        assert_eq!(translate(&pick, &view, rect), Some(Input::Pick { x: 0, y: 0 }));

        let up = Event::PointerButton {
            pos: Pos2::new(500.0, 500.0),
            button: PointerButton::Primary,
            pressed: false,
            modifiers: Modifiers::NONE,
        };
        assert_eq!(translate(&up, &view, rect), Some(Input::Up));
    }

    #[test]
    fn test_leaving_the_canvas() {
        let (view, rect) = setup();
        assert_eq!(
            translate(&Event::PointerMoved(Pos2::new(5.0, 5.0)), &view, rect),
            Some(Input::Leave)
        );
        assert_eq!(translate(&Event::PointerGone, &view, rect), Some(Input::Leave));
        assert_eq!(
            translate(&Event::PointerMoved(Pos2::new(40.0, 40.0)), &view, rect),
            Some(Input::Move { x: 1, y: 1 })
        );
    }

    #[test]
    fn test_keys_and_zoom() {
        let (view, rect) = setup();
        assert_eq!(
            translate(&key(Key::E, Modifiers::NONE), &view, rect),
            Some(Input::Action(Action::ToggleEraser))
        );
        assert_eq!(translate(&key(Key::A, Modifiers::NONE), &view, rect), None);
        assert_eq!(translate(&Event::Zoom(1.1), &view, rect), Some(Input::Zoom(1.1)));
    }
}
