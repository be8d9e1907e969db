//! Demo greeting controller, mounted at `/app/greeting`.

use crate::routing::{Controller, RequestParam, Route};

pub const GREETING_PATH: &str = "/greeting";
pub const NAME_PARAM: &str = "name";
pub const DEFAULT_NAME: &str = "World";

#[derive(Debug, Clone, Copy, Default)]
pub struct GreetingController;

impl GreetingController {
    pub fn greet(name: &str) -> String {
        format!("Hello, {}!", name)
    }
}

impl Controller for GreetingController {
    fn routes(&self) -> Vec<Route> {
        vec![Route::new(
            GREETING_PATH,
            RequestParam::new(NAME_PARAM, DEFAULT_NAME),
            Self::greet,
        )]
    }
}
