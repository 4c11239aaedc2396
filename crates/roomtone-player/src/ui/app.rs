//! Main application state and view

use std::time::Duration;

use iced::widget::{button, column, container, row, slider, text};
use iced::{time, Alignment, Color, Element, Length, Subscription, Task, Theme};

use roomtone_core::controller::TransportController;

use super::message::Message;

/// Label refresh interval
const POSITION_TICK: Duration = Duration::from_millis(20);

/// Engine/loader polling interval
const ENGINE_PUMP: Duration = Duration::from_millis(10);

const LABEL_WIDTH: f32 = 80.0;

pub struct RoomtoneApp {
    controller: TransportController,
}

impl RoomtoneApp {
    pub fn new(controller: TransportController) -> Self {
        Self { controller }
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::OpenClicked => {
                return Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .set_title("Select wav file to play...")
                            .add_filter("WAV files", &["wav", "WAV"])
                            .pick_file()
                            .await
                            .map(|f| f.path().to_path_buf())
                    },
                    Message::FileChosen,
                );
            }
            Message::FileChosen(path) => self.controller.open(path),
            Message::PlayClicked => {
                self.controller.play_clicked();
            }
            Message::StopClicked => {
                self.controller.stop_clicked();
            }
            Message::RoomSizeChanged(value) => self.controller.set_room_size(value),
            Message::WetChanged(value) => self.controller.set_wet_level(value),
            Message::DryChanged(value) => self.controller.set_dry_level(value),
            Message::PositionTick => self.controller.timer_tick(),
            Message::EnginePump => self.controller.pump(),
        }
        Task::none()
    }

    pub fn view(&self) -> Element<'_, Message> {
        let controls = self.controller.controls();
        let params = self.controller.reverb_parameters();

        let open_label = if self.controller.is_loading() { "Loading..." } else { "Open..." };
        let open_btn = button(text(open_label)).on_press(Message::OpenClicked).width(Length::Fill);

        let play_btn = button(text(controls.play_label))
            .on_press_maybe(controls.play_enabled.then_some(Message::PlayClicked))
            .width(Length::Fill)
            .style(button::success);

        let stop_btn = button(text(controls.stop_label))
            .on_press_maybe(controls.stop_enabled.then_some(Message::StopClicked))
            .width(Length::Fill)
            .style(button::danger);

        let position = text(self.controller.position_label())
            .size(16)
            .color(Color::from_rgb(0.3, 0.8, 0.4));

        let mut content = column![
            open_btn,
            play_btn,
            stop_btn,
            slider_row("Room Size:", params.room_size, Message::RoomSizeChanged),
            slider_row("Wet:", params.wet_level, Message::WetChanged),
            slider_row("Dry:", params.dry_level, Message::DryChanged),
            position,
        ]
        .spacing(10);

        if let Some(status) = self.controller.status() {
            content = content.push(text(status).size(12));
        }

        container(content).padding(10).into()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            time::every(POSITION_TICK).map(|_| Message::PositionTick),
            time::every(ENGINE_PUMP).map(|_| Message::EnginePump),
        ])
    }

    /// Window title, with the loaded file's name
    pub fn title(&self) -> String {
        match self.controller.loaded_path().and_then(|p| p.file_name()) {
            Some(name) => format!("Roomtone - {}", name.to_string_lossy()),
            None => "Roomtone".to_string(),
        }
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn slider_row<'a>(label: &'a str, value: f32, on_change: fn(f32) -> Message) -> Element<'a, Message> {
    row![
        text(label).width(Length::Fixed(LABEL_WIDTH)),
        slider(0.0..=1.0, value, on_change).step(0.01),
    ]
    .spacing(8)
    .align_y(Alignment::Center)
    .into()
}
