/// Up Up Down Down Left Right Left Right B A.
pub const KONAMI_CODE: [&str; 10] = [
    "ArrowUp",
    "ArrowUp",
    "ArrowDown",
    "ArrowDown",
    "ArrowLeft",
    "ArrowRight",
    "ArrowLeft",
    "ArrowRight",
    "KeyB",
    "KeyA",
];

/// Matches a fixed key sequence against a stream of key codes.
#[derive(Debug, Clone)]
pub struct SecretCodeDetector {
    code: Vec<String>,
    progress: usize,
}

impl SecretCodeDetector {
    /// Returns `None` for an empty code.
    pub fn new<I, S>(code: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let code: Vec<String> = code.into_iter().map(Into::into).collect();
        if code.is_empty() {
            return None;
        }
        Some(Self { code, progress: 0 })
    }

    pub fn konami() -> Self {
        Self {
            code: KONAMI_CODE.iter().map(|k| k.to_string()).collect(),
            progress: 0,
        }
    }

    pub fn progress(&self) -> usize {
        self.progress
    }

    /// Feeds one key; true when it completes the code.
    pub fn feed(&mut self, key: &str) -> bool {
        if self.code[self.progress] == key {
            self.progress += 1;
            if self.progress == self.code.len() {
                self.progress = 0;
                tracing::info!("secret code entered");
                return true;
            }
            return false;
        }
        self.progress = usize::from(self.code[0] == key);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_code_fires_once() {
        let mut detector = SecretCodeDetector::konami();
        let fired: Vec<bool> = KONAMI_CODE.iter().map(|k| detector.feed(k)).collect();
        assert_eq!(fired.iter().filter(|f| **f).count(), 1);
        assert!(fired[9]);
        assert_eq!(detector.progress(), 0);
    }

    #[test]
    fn mismatch_resets_and_first_key_restarts() {
        let mut detector = SecretCodeDetector::konami();
        detector.feed("ArrowUp");
        detector.feed("ArrowUp");
        detector.feed("KeyX");
        assert_eq!(detector.progress(), 0);

        detector.feed("ArrowUp");
        detector.feed("ArrowUp");
        // a third Up breaks the sequence but counts as a fresh start
        detector.feed("ArrowUp");
        assert_eq!(detector.progress(), 1);
    }

    #[test]
    fn empty_code_is_rejected() {
        assert!(SecretCodeDetector::new(Vec::<String>::new()).is_none());
        let mut d = SecretCodeDetector::new(["x"]).unwrap();
        assert!(d.feed("x"));
    }
}
