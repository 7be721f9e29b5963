//! # Main Display Module
//!
//! Lays out the bar graph, the note read-out and the control buttons.

use iced::widget::{button, column, container, horizontal_space, row, text, Space};
use iced::{Alignment, Element, Length};

use crate::widgets::bar_graph::BarGraph;
use crate::{AppDisplayData, AudioStatus, Message};

/// Creates the complete main application view.
pub fn create_main_view(data: &AppDisplayData) -> Element<'static, Message> {
    let title = text("Note Bar").size(28);

    let main_content = column![
        row![
            title,
            horizontal_space(),
            create_status_label(&data.audio_status),
        ]
        .align_y(Alignment::Center),
        Space::with_height(20),
        create_screen_panel(data),
        Space::with_height(10),
        create_controls(),
    ]
    .spacing(10)
    .padding(20);

    container(main_content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

/// The emulated screen: bars on the left, note on the right.
fn create_screen_panel(data: &AppDisplayData) -> Element<'static, Message> {
    let display = data.last_report.as_ref().map(|report| report.display.clone());
    let graph = container(BarGraph::new(display, data.band_count).view())
        .width(Length::FillPortion(3))
        .height(Length::Fill);

    let (note_text, freq_text) = match data.last_report.as_ref().and_then(|r| r.pitch.as_ref()) {
        Some(pitch) => (pitch.name().to_string(), format!("{:.1} Hz", pitch.frequency_hz)),
        None => ("--".to_string(), "".to_string()),
    };

    let note_panel = container(
        column![
            text("Note").size(14),
            Space::with_height(5),
            text(note_text).size(64),
            text(freq_text).size(18),
        ]
        .align_x(Alignment::Center)
        .spacing(5),
    )
    .width(Length::FillPortion(1))
    .center_x(Length::FillPortion(1))
    .padding(15);

    container(row![graph, Space::with_width(10), note_panel].align_y(Alignment::Start))
        .width(Length::Fill)
        .height(Length::Fixed(260.0))
        .into()
}

fn create_status_label(status: &AudioStatus) -> Element<'static, Message> {
    let label = match status {
        AudioStatus::Running => "Listening".to_string(),
        AudioStatus::Failed(reason) => format!("No input: {}", reason),
    };
    text(label).size(14).into()
}

fn create_controls() -> Element<'static, Message> {
    row![
        button("Reset").on_press(Message::ResetAnalyzer),
        Space::with_width(10),
        button("Quit").on_press(Message::Exit),
    ]
    .into()
}
