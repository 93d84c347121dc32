mod app;
mod preview_surface;
mod settings;
mod workers;

use app::App;
use camsight_core::shared::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

fn main() -> iced::Result {
    env_logger::init();

    iced::application(App::new, App::update, App::view)
        .title("CamSight")
        .subscription(App::subscription)
        .window(iced::window::Settings {
            size: iced::Size::new(DISPLAY_WIDTH as f32 + 40.0, DISPLAY_HEIGHT as f32 + 150.0),
            ..Default::default()
        })
        .run()
}
