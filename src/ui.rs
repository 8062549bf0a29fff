use iced::widget::{button, container, text, Column, Row, Space};
use iced::{
    event, mouse, window, Alignment, Background, Element, Font, Length, Point, Size,
    Subscription, Task, Theme,
};
use std::time::{Duration, Instant};

use crate::drag::DragSnap;
use crate::metrics::{SamplerHandle, Snapshot};
use crate::rows::{self, OVERLAY_WIDTH, ROW_HEIGHT};
use crate::theme;

#[derive(Debug, Clone)]
pub enum Message {
    Tick,
    CursorMoved(Point),
    LeftPressed,
    LeftReleased,
    Opened(window::Id, Option<Point>),
    Moved(Point),
    Close,
}

pub struct Overlay {
    sampler: SamplerHandle,
    snapshot: Snapshot,
    drag: DragSnap,
    window: Option<window::Id>,
    /// Top-left of the window, tracked through Opened/Moved events and the
    /// positions we command ourselves while dragging.
    position: Point,
    /// Derived height; only changes when the rendered row count changes.
    height: f32,
    /// Last window-local cursor position, the anchor source on press.
    cursor: Point,
}

impl Overlay {
    pub fn new() -> Self {
        let sampler = SamplerHandle::spawn();
        // Request the first sample right away so the window never sits on
        // zeroed rows for a full tick.
        sampler.request(Instant::now());

        let snapshot = Snapshot::default();
        let height = rows::window_height(rows::visible_rows(&snapshot).len());

        Self {
            sampler,
            snapshot,
            drag: DragSnap::new(),
            window: None,
            position: Point::ORIGIN,
            height,
            cursor: Point::ORIGIN,
        }
    }

    pub fn title(&self) -> String {
        String::from("Limpet")
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let tick = iced::time::every(Duration::from_secs(1)).map(|_| Message::Tick);
        let events = event::listen_with(map_event);
        Subscription::batch([tick, events])
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => {
                self.sampler.request(Instant::now());
                self.snapshot = self.sampler.latest();

                let height = rows::window_height(rows::visible_rows(&self.snapshot).len());
                if height != self.height {
                    self.height = height;
                    if let Some(id) = self.window {
                        return window::resize(id, Size::new(OVERLAY_WIDTH, height));
                    }
                }
                Task::none()
            }
            Message::CursorMoved(pointer) => {
                self.cursor = pointer;
                let moved = self.drag.drag_to(
                    pointer,
                    self.position,
                    Size::new(OVERLAY_WIDTH, self.height),
                    crate::screen_bounds(),
                );
                if let Some(pos) = moved {
                    self.position = pos;
                    if let Some(id) = self.window {
                        return window::move_to(id, pos);
                    }
                }
                Task::none()
            }
            Message::LeftPressed => {
                self.drag.begin(self.cursor);
                Task::none()
            }
            Message::LeftReleased => {
                self.drag.end();
                Task::none()
            }
            Message::Opened(id, position) => {
                self.window = Some(id);
                if let Some(pos) = position {
                    self.position = pos;
                }
                Task::none()
            }
            Message::Moved(position) => {
                // Mid-gesture we already track the positions we command;
                // adopting lagging move events would make the card stutter.
                if !self.drag.is_active() {
                    self.position = position;
                }
                Task::none()
            }
            Message::Close => match self.window {
                Some(id) => window::close(id),
                None => Task::none(),
            },
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let pal = theme::palette();

        let mut grid = Column::new();
        for (i, (metric, value)) in rows::visible_rows(&self.snapshot).into_iter().enumerate() {
            let mut line = Row::new()
                .push(
                    text(metric.label())
                        .size(12)
                        .font(Font::MONOSPACE)
                        .color(pal.text)
                        .width(Length::Fixed(86.0)),
                )
                .push(text(value).size(12).font(Font::MONOSPACE).color(pal.text))
                .height(Length::Fixed(ROW_HEIGHT))
                .align_y(Alignment::Center);
            if i == 0 {
                line = line
                    .push(Space::with_width(Length::Fill))
                    .push(close_button(&pal));
            }
            grid = grid.push(line);
        }

        container(grid.width(Length::Fill))
            .width(Length::Fill)
            .height(Length::Fill)
            .padding([0, 6])
            .style(move |_: &Theme| container::Style {
                background: Some(Background::Color(pal.bg)),
                ..Default::default()
            })
            .into()
    }
}

fn close_button(pal: &theme::Palette) -> Element<'static, Message> {
    let close_bg = pal.close_bg;
    let close_text = pal.close_text;
    button(text("\u{2715}").size(12).color(close_text))
        .on_press(Message::Close)
        .padding([0, 6])
        .style(move |_: &Theme, _status| button::Style {
            background: Some(Background::Color(close_bg)),
            text_color: close_text,
            ..Default::default()
        })
        .into()
}

fn map_event(event: iced::Event, status: event::Status, id: window::Id) -> Option<Message> {
    match event {
        iced::Event::Window(window::Event::Opened { position, .. }) => {
            Some(Message::Opened(id, position))
        }
        iced::Event::Window(window::Event::Moved(position)) => Some(Message::Moved(position)),
        iced::Event::Mouse(mouse::Event::CursorMoved { position }) => {
            Some(Message::CursorMoved(position))
        }
        iced::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
            // A press swallowed by a widget (the close button) must not
            // start a drag gesture.
            matches!(status, event::Status::Ignored).then_some(Message::LeftPressed)
        }
        iced::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
            Some(Message::LeftReleased)
        }
        _ => None,
    }
}
