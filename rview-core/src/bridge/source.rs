//! Frame source adapter: the session's only route to the renderer.
//!
//! The adapter holds a **non-owning** handle. The renderer can be dropped
//! at any time by its owner; every access upgrades the handle first and
//! reports [`BridgeError::RendererUnavailable`] when that fails.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::bridge::event::{EventKind, InteractionEvent, Modifiers};
use crate::bridge::renderer::{Interactor, InteractorEvent, Renderer};
use crate::bridge::types::RawPixels;
use crate::error::BridgeError;

/// DOM key names that differ from the renderer's key-symbol vocabulary.
const KEY_TO_SYM: &[(&str, &str)] = &[
    ("Shift", "Shift_L"),
    ("Control", "Control_L"),
    ("Alt", "Alt_L"),
    ("ArrowLeft", "Left"),
    ("ArrowRight", "Right"),
    ("ArrowUp", "Up"),
    ("ArrowDown", "Down"),
    ("Enter", "Return"),
    ("Backspace", "BackSpace"),
    ("PageUp", "Prior"),
    ("PageDown", "Next"),
    (" ", "space"),
];

/// Translate a DOM key name into a renderer key symbol, falling back to
/// the key itself.
pub fn key_to_sym(key: &str) -> &str {
    KEY_TO_SYM
        .iter()
        .find(|(dom, _)| *dom == key)
        .map_or(key, |&(_, sym)| sym)
}

// ── FrameSource ──────────────────────────────────────────────────

pub struct FrameSource {
    renderer: Weak<RefCell<dyn Renderer>>,
    /// Canvas size snapshot; pixel readback and y-flipping use this.
    width: u32,
    height: u32,
    transparent: bool,
}

impl FrameSource {
    /// Bind to a live renderer, taking its current size as the canvas
    /// size and switching it to off-screen rendering.
    pub fn new<R: Renderer + 'static>(renderer: &Rc<RefCell<R>>, transparent: bool) -> Result<Self, BridgeError> {
        let (width, height) = {
            let mut r = renderer
                .try_borrow_mut()
                .map_err(|_| BridgeError::RenderFailure("renderer is busy".into()))?;
            r.set_offscreen_rendering(true);
            r.size()
        };
        if width == 0 || height == 0 {
            return Err(BridgeError::config(format!(
                "renderer reports an empty canvas ({width}x{height})"
            )));
        }

        // Unsize a temporary strong handle; only the weak one outlives this call.
        let strong: Rc<RefCell<dyn Renderer>> = renderer.clone();
        Ok(Self {
            renderer: Rc::downgrade(&strong),
            width,
            height,
            transparent,
        })
    }

    /// Run `f` against the renderer if it still exists.
    pub fn with_renderer<T>(
        &self,
        f: impl FnOnce(&mut dyn Renderer) -> Result<T, BridgeError>,
    ) -> Result<T, BridgeError> {
        let rc = self.renderer.upgrade().ok_or(BridgeError::RendererUnavailable)?;
        let mut r = rc
            .try_borrow_mut()
            .map_err(|_| BridgeError::RenderFailure("renderer is busy".into()))?;
        f(&mut *r)
    }

    pub fn is_available(&self) -> bool {
        self.renderer.strong_count() > 0
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn transparent(&self) -> bool {
        self.transparent
    }

    /// Resize the renderer and adopt the new canvas size.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), BridgeError> {
        if width == 0 || height == 0 {
            return Err(BridgeError::config(format!("cannot resize to {width}x{height}")));
        }
        self.with_renderer(|r| {
            r.resize(width, height);
            Ok(())
        })?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Read the current frame, rendering a fresh one first when
    /// `force_render` is set.
    pub fn get_frame(&self, force_render: bool) -> Result<RawPixels, BridgeError> {
        let (w, h) = (self.width, self.height);
        let rgba = self.with_renderer(|r| {
            if force_render {
                r.render()?;
            }
            r.rgba_pixels(0, 0, w - 1, h - 1)
        })?;
        RawPixels::from_bottom_up_rgba(w, h, &rgba, self.transparent)
    }

    /// Load `event`'s data into the interactor, then fire `notifications`
    /// in order.
    pub fn inject(&self, event: &InteractionEvent, notifications: &[InteractorEvent]) -> Result<(), BridgeError> {
        let height = self.height as i32;
        self.with_renderer(|r| {
            let it = r.interactor();
            apply_event_data(it, event, height);
            for &n in notifications {
                it.invoke(n);
            }
            Ok(())
        })
    }
}

/// Key events carry a key symbol / code; everything else carries a
/// position, flipped to the renderer's bottom-left origin.
fn apply_event_data(it: &mut dyn Interactor, event: &InteractionEvent, canvas_height: i32) {
    if event.kind.is_key() {
        if let Some(key) = event.key.as_deref() {
            it.set_key_sym(key_to_sym(key));
            let mut chars = key.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                it.set_key_code(c);
            }
        }
        it.set_repeat_count(1);
    } else if let Some((x, y)) = event.position {
        it.set_event_position(x, canvas_height - y);
    }

    if let Some(m) = event.modifiers {
        it.set_shift_key(m.contains(Modifiers::SHIFT));
        it.set_control_key(m.contains(Modifiers::CONTROL));
        it.set_alt_key(m.contains(Modifiers::ALT));
    }
}

/// Notification for a button press/release given the event kind.
pub(crate) fn button_notification(event: &InteractionEvent) -> Option<InteractorEvent> {
    use crate::bridge::event::PointerButton::*;
    let press = match event.kind {
        EventKind::PointerDown => true,
        EventKind::PointerUp => false,
        _ => return None,
    };
    Some(match (event.button?, press) {
        (Left, true) => InteractorEvent::LeftButtonPress,
        (Left, false) => InteractorEvent::LeftButtonRelease,
        (Middle, true) => InteractorEvent::MiddleButtonPress,
        (Middle, false) => InteractorEvent::MiddleButtonRelease,
        (Right, true) => InteractorEvent::RightButtonPress,
        (Right, false) => InteractorEvent::RightButtonRelease,
    })
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::event::PointerButton;

    #[derive(Default)]
    struct Canvas {
        renders: u32,
        offscreen: bool,
        size: (u32, u32),
        position: Option<(i32, i32)>,
        sym: Option<String>,
        code: Option<char>,
        shift: Option<bool>,
        fired: Vec<InteractorEvent>,
    }

    impl Interactor for Canvas {
        fn set_event_position(&mut self, x: i32, y: i32) {
            self.position = Some((x, y));
        }
        fn set_key_sym(&mut self, sym: &str) {
            self.sym = Some(sym.to_string());
        }
        fn set_key_code(&mut self, code: char) {
            self.code = Some(code);
        }
        fn set_repeat_count(&mut self, _count: u32) {}
        fn set_shift_key(&mut self, pressed: bool) {
            self.shift = Some(pressed);
        }
        fn set_control_key(&mut self, _pressed: bool) {}
        fn set_alt_key(&mut self, _pressed: bool) {}
        fn invoke(&mut self, event: InteractorEvent) {
            self.fired.push(event);
        }
    }

    impl Renderer for Canvas {
        fn size(&self) -> (u32, u32) {
            self.size
        }
        fn resize(&mut self, width: u32, height: u32) {
            self.size = (width, height);
        }
        fn render(&mut self) -> Result<(), BridgeError> {
            self.renders += 1;
            Ok(())
        }
        fn rgba_pixels(&mut self, x0: u32, y0: u32, x1: u32, y1: u32) -> Result<Vec<u8>, BridgeError> {
            let n = ((x1 - x0 + 1) * (y1 - y0 + 1)) as usize;
            Ok(vec![9; n * 4])
        }
        fn interactor(&mut self) -> &mut dyn Interactor {
            self
        }
        fn set_offscreen_rendering(&mut self, enabled: bool) {
            self.offscreen = enabled;
        }
    }

    fn canvas(w: u32, h: u32) -> Rc<RefCell<Canvas>> {
        Rc::new(RefCell::new(Canvas {
            size: (w, h),
            ..Canvas::default()
        }))
    }

    #[test]
    fn binds_with_renderer_size_and_offscreen() {
        let r = canvas(40, 30);
        let src = FrameSource::new(&r, false).unwrap();
        assert_eq!(src.canvas_size(), (40, 30));
        assert!(r.borrow().offscreen);
    }

    #[test]
    fn binding_holds_no_strong_reference() {
        let r = canvas(4, 2);
        let src = FrameSource::new(&r, false).unwrap();
        assert_eq!(Rc::strong_count(&r), 1);
        assert_eq!(Rc::weak_count(&r), 1);
        assert!(src.is_available());
    }

    #[test]
    fn empty_canvas_is_invalid_config() {
        let r = canvas(0, 30);
        assert!(matches!(FrameSource::new(&r, false), Err(BridgeError::InvalidConfig(_))));
    }

    #[test]
    fn forced_frame_renders_first() {
        let r = canvas(4, 2);
        let src = FrameSource::new(&r, false).unwrap();
        let px = src.get_frame(true).unwrap();
        assert_eq!(px.byte_len(), 4 * 2 * 3);
        assert_eq!(r.borrow().renders, 1);

        src.get_frame(false).unwrap();
        assert_eq!(r.borrow().renders, 1);
    }

    #[test]
    fn dropped_renderer_is_unavailable() {
        let r = canvas(4, 2);
        let src = FrameSource::new(&r, false).unwrap();
        drop(r);
        assert!(!src.is_available());
        assert!(matches!(src.get_frame(true), Err(BridgeError::RendererUnavailable)));
        let ev = InteractionEvent::new(EventKind::PointerMove).at(1, 1);
        assert!(matches!(
            src.inject(&ev, &[InteractorEvent::MouseMove]),
            Err(BridgeError::RendererUnavailable)
        ));
    }

    #[test]
    fn inject_flips_y_and_sets_modifiers() {
        let r = canvas(100, 50);
        let src = FrameSource::new(&r, false).unwrap();
        let ev = InteractionEvent::new(EventKind::PointerDown)
            .at(10, 5)
            .with_button(PointerButton::Left)
            .with_modifiers(Modifiers::SHIFT);
        src.inject(&ev, &[InteractorEvent::LeftButtonPress]).unwrap();

        let p = r.borrow();
        assert_eq!(p.position, Some((10, 45)));
        assert_eq!(p.shift, Some(true));
        assert_eq!(p.fired, vec![InteractorEvent::LeftButtonPress]);
    }

    #[test]
    fn key_events_set_sym_and_code() {
        let r = canvas(10, 10);
        let src = FrameSource::new(&r, false).unwrap();

        src.inject(&InteractionEvent::new(EventKind::KeyDown).with_key("r"), &[]).unwrap();
        assert_eq!(r.borrow().sym.as_deref(), Some("r"));
        assert_eq!(r.borrow().code, Some('r'));

        src.inject(&InteractionEvent::new(EventKind::KeyDown).with_key("Shift"), &[])
            .unwrap();
        assert_eq!(r.borrow().sym.as_deref(), Some("Shift_L"));
        // Multi-character keys leave the key code alone.
        assert_eq!(r.borrow().code, Some('r'));
    }

    #[test]
    fn key_sym_table() {
        assert_eq!(key_to_sym("Control"), "Control_L");
        assert_eq!(key_to_sym("ArrowUp"), "Up");
        assert_eq!(key_to_sym("F5"), "F5");
    }

    #[test]
    fn button_notifications() {
        let down = InteractionEvent::new(EventKind::PointerDown).with_button(PointerButton::Right);
        assert_eq!(button_notification(&down), Some(InteractorEvent::RightButtonPress));
        let up = InteractionEvent::new(EventKind::PointerUp).with_button(PointerButton::Middle);
        assert_eq!(button_notification(&up), Some(InteractorEvent::MiddleButtonRelease));
        let none = InteractionEvent::new(EventKind::PointerDown);
        assert_eq!(button_notification(&none), None);
    }
}
