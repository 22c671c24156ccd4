//! View router: the kiosk's finite set of screens and the taps that move
//! between them.

use kiosk_shared::content::DeckId;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Screensaver,
    Menu,
    Dashboards,
    Presentation(DeckId),
}

impl View {
    pub fn name(self) -> &'static str {
        match self {
            View::Screensaver => "screensaver",
            View::Menu => "menu",
            View::Dashboards => "dashboards",
            View::Presentation(DeckId::Maturity) => "maturity",
            View::Presentation(DeckId::Ngfw) => "ngfw",
            View::Presentation(DeckId::Products) => "products",
        }
    }

    pub fn is_content(self) -> bool {
        matches!(self, View::Dashboards | View::Presentation(_))
    }

    /// Content view a menu card route opens.
    pub fn from_route(route: &str) -> Option<View> {
        match route.trim_end_matches('/') {
            "/dashboards" => Some(View::Dashboards),
            "/maturity" => Some(View::Presentation(DeckId::Maturity)),
            "/ngfw" => Some(View::Presentation(DeckId::Ngfw)),
            "/products" => Some(View::Presentation(DeckId::Products)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteEvent {
    ScreensaverTap,
    CardSelected(String),
    Home,
    LogoTap,
    IdleTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed { from: View, to: View },
    Ignored,
}

#[derive(Debug, Default)]
pub struct Router {
    current: View,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> View {
        self.current
    }

    pub fn handle(&mut self, event: &RouteEvent) -> Transition {
        let next = match (self.current, event) {
            (View::Screensaver, RouteEvent::ScreensaverTap) => Some(View::Menu),
            (View::Menu, RouteEvent::CardSelected(route)) => {
                let target = View::from_route(route);
                if target.is_none() {
                    warn!("router: unknown route '{}'", route);
                }
                target
            }
            (v, RouteEvent::Home) if v.is_content() => Some(View::Menu),
            (View::Menu, RouteEvent::LogoTap) => Some(View::Screensaver),
            (v, RouteEvent::IdleTimeout) if v != View::Screensaver => Some(View::Screensaver),
            _ => None,
        };

        match next {
            Some(to) => {
                let from = self.current;
                self.current = to;
                info!("router: {} → {} ({:?})", from.name(), to.name(), event);
                Transition::Changed { from, to }
            }
            None => {
                debug!("router: {:?} ignored in {}", event, self.current.name());
                Transition::Ignored
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_views() -> Vec<View> {
        vec![
            View::Screensaver,
            View::Menu,
            View::Dashboards,
            View::Presentation(DeckId::Maturity),
            View::Presentation(DeckId::Ngfw),
            View::Presentation(DeckId::Products),
        ]
    }

    fn at(view: View) -> Router {
        Router { current: view }
    }

    #[test]
    fn test_starts_on_screensaver() {
        assert_eq!(Router::new().current(), View::Screensaver);
    }

    #[test]
    fn test_home_from_any_content_view_lands_on_menu() {
        for view in all_views().into_iter().filter(|v| v.is_content()) {
            let mut r = at(view);
            assert_eq!(
                r.handle(&RouteEvent::Home),
                Transition::Changed {
                    from: view,
                    to: View::Menu
                }
            );
        }
    }

    #[test]
    fn test_only_screensaver_tap_leaves_screensaver() {
        let others = [
            RouteEvent::CardSelected("/dashboards".into()),
            RouteEvent::Home,
            RouteEvent::LogoTap,
            RouteEvent::IdleTimeout,
        ];
        for event in &others {
            let mut r = Router::new();
            assert_eq!(r.handle(event), Transition::Ignored, "{:?}", event);
            assert_eq!(r.current(), View::Screensaver);
        }
        let mut r = Router::new();
        r.handle(&RouteEvent::ScreensaverTap);
        assert_eq!(r.current(), View::Menu);
    }

    #[test]
    fn test_card_routes() {
        for (route, view) in [
            ("/dashboards", View::Dashboards),
            ("/maturity", View::Presentation(DeckId::Maturity)),
            ("/ngfw", View::Presentation(DeckId::Ngfw)),
            ("/products", View::Presentation(DeckId::Products)),
        ] {
            let mut r = at(View::Menu);
            r.handle(&RouteEvent::CardSelected(route.to_string()));
            assert_eq!(r.current(), view);
        }
    }

    #[test]
    fn test_unknown_route_is_ignored() {
        let mut r = at(View::Menu);
        assert_eq!(
            r.handle(&RouteEvent::CardSelected("/weather".into())),
            Transition::Ignored
        );
        assert_eq!(r.current(), View::Menu);
    }

    #[test]
    fn test_logo_tap_returns_to_screensaver() {
        let mut r = at(View::Menu);
        r.handle(&RouteEvent::LogoTap);
        assert_eq!(r.current(), View::Screensaver);
    }

    #[test]
    fn test_idle_timeout_from_everywhere() {
        for view in all_views() {
            let mut r = at(view);
            r.handle(&RouteEvent::IdleTimeout);
            assert_eq!(r.current(), View::Screensaver);
        }
    }

    #[test]
    fn test_screensaver_tap_elsewhere_is_ignored() {
        let mut r = at(View::Dashboards);
        assert_eq!(r.handle(&RouteEvent::ScreensaverTap), Transition::Ignored);
        assert_eq!(r.current(), View::Dashboards);
    }
}
