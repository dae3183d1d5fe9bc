mod pixel_buffer;

pub use pixel_buffer::PixelBuffer;

#[cfg(feature = "window")]
pub use window::{Display, InputEvent, RenderTarget};

#[cfg(feature = "window")]
mod window {
    use sdl2::event::Event;
    use sdl2::keyboard::Keycode;
    use sdl2::pixels::PixelFormatEnum;
    use sdl2::render::{Canvas, Texture, TextureCreator};
    use sdl2::video::{Window, WindowContext};
    use sdl2::EventPump;

    use super::PixelBuffer;
    use crate::error::DisplayError;

    pub struct Display {
        canvas: Canvas<Window>,
        event_pump: EventPump,
        width: u32,
        height: u32,
    }

    /// Streaming texture the finished frame is uploaded into
    pub struct RenderTarget<'a> {
        texture: Texture<'a>,
        width: u32,
        height: u32,
    }

    #[derive(Debug, Clone)]
    pub enum InputEvent {
        Quit,
        KeyDown(Keycode),
        KeyUp(Keycode),
    }

    impl Display {
        /// Create a window of `width` x `height`
        /// vsync=true: locked to monitor refresh
        /// vsync=false: uncapped framerate for performance testing
        pub fn with_options(
            title: &str,
            width: u32,
            height: u32,
            vsync: bool,
        ) -> Result<(Self, TextureCreator<WindowContext>), DisplayError> {
            let sdl_context = sdl2::init()?;
            let video_subsystem = sdl_context.video()?;

            let window = video_subsystem
                .window(title, width, height)
                .position_centered()
                .build()
                .map_err(|e| DisplayError(e.to_string()))?;

            let mut canvas_builder = window.into_canvas().accelerated();
            if vsync {
                canvas_builder = canvas_builder.present_vsync();
            }
            let canvas = canvas_builder
                .build()
                .map_err(|e| DisplayError(e.to_string()))?;

            let texture_creator = canvas.texture_creator();
            let event_pump = sdl_context.event_pump()?;

            Ok((
                Self {
                    canvas,
                    event_pump,
                    width,
                    height,
                },
                texture_creator,
            ))
        }

        pub fn width(&self) -> u32 {
            self.width
        }

        pub fn height(&self) -> u32 {
            self.height
        }

        pub fn present(
            &mut self,
            target: &mut RenderTarget,
            buffer: &PixelBuffer,
        ) -> Result<(), DisplayError> {
            if (buffer.width(), buffer.height()) != (target.width, target.height) {
                return Err(DisplayError(format!(
                    "buffer is {}x{}, target is {}x{}",
                    buffer.width(),
                    buffer.height(),
                    target.width,
                    target.height
                )));
            }
            target
                .texture
                .update(None, buffer.as_bytes(), (buffer.width() * 4) as usize)
                .map_err(|e| DisplayError(e.to_string()))?;

            self.canvas.copy(&target.texture, None, None)?;
            self.canvas.present();
            Ok(())
        }

        pub fn poll_events(&mut self) -> Vec<InputEvent> {
            let mut events = Vec::new();

            for event in self.event_pump.poll_iter() {
                match event {
                    Event::Quit { .. } => events.push(InputEvent::Quit),
                    Event::KeyDown {
                        keycode: Some(k), ..
                    } => events.push(InputEvent::KeyDown(k)),
                    Event::KeyUp {
                        keycode: Some(k), ..
                    } => events.push(InputEvent::KeyUp(k)),
                    _ => {},
                }
            }

            events
        }
    }

    impl<'a> RenderTarget<'a> {
        pub fn with_size(
            texture_creator: &'a TextureCreator<WindowContext>,
            width: u32,
            height: u32,
        ) -> Result<Self, DisplayError> {
            let texture = texture_creator
                .create_texture_streaming(PixelFormatEnum::RGBA8888, width, height)
                .map_err(|e| DisplayError(e.to_string()))?;
            Ok(Self {
                texture,
                width,
                height,
            })
        }
    }
}
