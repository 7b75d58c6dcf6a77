use std::sync::Mutex;

use portal_app_core::RouterPort;

/// Router for headless runs: remembers the current route and announces changes.
#[derive(Debug, Default)]
pub struct StdoutRouter {
    current: Mutex<Option<String>>,
}

impl StdoutRouter {
    pub fn starting_at(route: impl Into<String>) -> Self {
        Self {
            current: Mutex::new(Some(route.into())),
        }
    }
}

impl RouterPort for StdoutRouter {
    fn current_route(&self) -> Option<String> {
        self.current.lock().ok().and_then(|c| c.clone())
    }

    fn push(&self, route: &str) -> anyhow::Result<()> {
        let mut current = self
            .current
            .lock()
            .map_err(|_| anyhow::anyhow!("router state poisoned"))?;
        println!(":: Route -> {route}");
        *current = Some(route.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_updates_current_route() {
        let router = StdoutRouter::starting_at("/");
        assert_eq!(router.current_route().as_deref(), Some("/"));
        router.push("/team").unwrap();
        assert_eq!(router.current_route().as_deref(), Some("/team"));
    }
}
