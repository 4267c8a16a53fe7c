/// Buttons the simulation cares about. Key bindings live in the game layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Left,
    Right,
    Up,
    Interact,
}

/// Boolean key-state query, polled once per controller update.
pub trait InputSource {
    fn is_pressed(&self, button: Button) -> bool;
}

/// Plain button-state holder. The game layer fills it from the real keyboard;
/// tests script it directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct ButtonStates {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub interact: bool,
}

impl InputSource for ButtonStates {
    fn is_pressed(&self, button: Button) -> bool {
        match button {
            Button::Left => self.left,
            Button::Right => self.right,
            Button::Up => self.up,
            Button::Interact => self.interact,
        }
    }
}
