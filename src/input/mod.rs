use egui::{Context, PointerButton, Pos2, Rect, Vec2};

/// Maps between screen points and reference image pixels for the canvas,
/// where the image is drawn uniformly scaled into `screen_rect`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    pub screen_rect: Rect,
    pub image_size: Vec2,
}

impl CanvasTransform {
    /// Largest uniform fit of `image_size` inside `available`, centred.
    pub fn fit(available: Rect, image_size: Vec2) -> Self {
        let scale = if image_size.x > 0.0 && image_size.y > 0.0 {
            (available.width() / image_size.x).min(available.height() / image_size.y)
        } else {
            1.0
        };
        Self {
            screen_rect: Rect::from_center_size(available.center(), image_size * scale),
            image_size,
        }
    }

    /// Screen points per image pixel
    pub fn scale(&self) -> f32 {
        if self.image_size.x > 0.0 {
            self.screen_rect.width() / self.image_size.x
        } else {
            1.0
        }
    }

    pub fn to_image(&self, screen: Pos2) -> Pos2 {
        ((screen - self.screen_rect.min) / self.scale()).to_pos2()
    }

    pub fn to_screen(&self, image: Pos2) -> Pos2 {
        self.screen_rect.min + image.to_vec2() * self.scale()
    }
}

/// Pointer events on the canvas, in image pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { position: Pos2 },
    PointerMove { position: Pos2 },
    PointerUp,
    /// The pointer left the canvas or the window
    PointerLeave,
}

/// Turns raw egui pointer input into canvas events.
#[derive(Debug, Default)]
pub struct InputHandler {
    last_pointer_pos: Option<Pos2>,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_input(&mut self, ctx: &Context, canvas: &CanvasTransform) -> Vec<InputEvent> {
        ctx.input(|input| {
            let hover = input.pointer.hover_pos();
            self.translate(
                hover.filter(|pos| canvas.screen_rect.contains(*pos)),
                input.pointer.button_pressed(PointerButton::Primary),
                input.pointer.button_released(PointerButton::Primary),
                canvas,
            )
        })
    }

    /// `inside` is the pointer position when it is over the canvas.
    fn translate(
        &mut self,
        inside: Option<Pos2>,
        pressed: bool,
        released: bool,
        canvas: &CanvasTransform,
    ) -> Vec<InputEvent> {
        let mut events = Vec::new();
        match inside {
            Some(pos) => {
                if self.last_pointer_pos != Some(pos) {
                    events.push(InputEvent::PointerMove {
                        position: canvas.to_image(pos),
                    });
                }
                if pressed {
                    events.push(InputEvent::PointerDown {
                        position: canvas.to_image(pos),
                    });
                }
                if released {
                    events.push(InputEvent::PointerUp);
                }
                self.last_pointer_pos = Some(pos);
            }
            None => {
                if self.last_pointer_pos.take().is_some() {
                    events.push(InputEvent::PointerLeave);
                } else if released {
                    events.push(InputEvent::PointerUp);
                }
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> CanvasTransform {
        CanvasTransform::fit(
            Rect::from_min_size(Pos2::new(0.0, 0.0), Vec2::new(400.0, 400.0)),
            Vec2::new(800.0, 400.0),
        )
    }

    #[test]
    fn test_fit_and_map() {
        let canvas = canvas();
        assert_eq!(canvas.scale(), 0.5);
        assert_eq!(canvas.screen_rect, Rect::from_min_size(Pos2::new(0.0, 100.0), Vec2::new(400.0, 200.0)));
        assert_eq!(canvas.to_image(Pos2::new(200.0, 200.0)), Pos2::new(400.0, 200.0));
        assert_eq!(canvas.to_screen(Pos2::new(400.0, 200.0)), Pos2::new(200.0, 200.0));
    }

    #[test]
    fn test_leave_is_reported_once() {
        let canvas = canvas();
        let mut handler = InputHandler::new();
        let events = handler.translate(Some(Pos2::new(10.0, 110.0)), true, false, &canvas);
        assert_eq!(
            events,
            vec![
                InputEvent::PointerMove { position: Pos2::new(20.0, 20.0) },
                InputEvent::PointerDown { position: Pos2::new(20.0, 20.0) },
            ]
        );
        assert_eq!(handler.translate(None, false, false, &canvas), vec![InputEvent::PointerLeave]);
        assert!(handler.translate(None, false, false, &canvas).is_empty());
    }
}
