//! # Bar Graph Widget
//!
//! Emulates the small monochrome screen the analyzer was built for: one bar
//! per display band on a black background, or a flat resting line when the
//! frame is quiet.

use iced::widget::canvas::{self, Geometry, Path};
use iced::widget::container;
use iced::{mouse, Color, Element, Point, Rectangle, Renderer, Size, Theme};

use notebar_core::Display;

/// Horizontal gap between bars, in pixels.
const BAR_GAP: f32 = 2.0;

/// Height of the resting line shown for quiet frames.
const REST_HEIGHT: f32 = 2.0;

const PIXEL_ON: Color = Color { r: 0.85, g: 0.95, b: 1.0, a: 1.0 };
const PIXEL_OFF: Color = Color::BLACK;

/// Bar graph widget for normalized band heights.
pub struct BarGraph {
    /// `None` until the first frame arrives.
    display: Option<Display>,
    band_count: usize,
}

impl BarGraph {
    pub fn new(display: Option<Display>, band_count: usize) -> Self {
        Self { display, band_count }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fill),
        )
        .into()
    }
}

impl<Message> canvas::Program<Message> for BarGraph {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        let background = Path::rectangle(Point::ORIGIN, bounds.size());
        frame.fill(&background, PIXEL_OFF);

        if !bounds.width.is_finite() || !bounds.height.is_finite() || self.band_count == 0 {
            return vec![frame.into_geometry()];
        }

        match &self.display {
            Some(Display::Bars(bars)) => {
                let slot_width = bounds.width / bars.len().max(1) as f32;
                let bar_width = (slot_width - BAR_GAP).max(1.0);

                for (i, &level) in bars.iter().enumerate() {
                    let height = level.clamp(0.0, 1.0) * bounds.height;
                    if height.is_finite() && height > 0.0 {
                        let bar = Path::rectangle(
                            Point::new(i as f32 * slot_width, bounds.height - height),
                            Size::new(bar_width, height),
                        );
                        frame.fill(&bar, PIXEL_ON);
                    }
                }
            }
            Some(Display::Quiet) | None => {
                let rest = Path::rectangle(
                    Point::new(0.0, bounds.height - REST_HEIGHT),
                    Size::new(bounds.width, REST_HEIGHT),
                );
                frame.fill(&rest, PIXEL_ON);
            }
        }

        vec![frame.into_geometry()]
    }
}
