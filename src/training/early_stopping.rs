use serde::{Deserialize, Serialize};

/// How the trailing validation-loss window is judged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EarlyStopRule {
    /// Stop when no epoch in the window beat the loss at the window start
    /// by more than `min_delta`.
    #[default]
    NoImprovement,
    /// Stop when the loss fell strictly at every step of the window.
    StrictlyDecreasing,
}

pub struct EarlyStopping {
    patience: usize,
    min_delta: f64,
    rule: EarlyStopRule,
    pub best_loss: f64,
}

impl EarlyStopping {
    pub fn new(patience: usize, min_delta: f64, rule: EarlyStopRule) -> Self {
        Self {
            patience,
            min_delta,
            rule,
            best_loss: f64::INFINITY,
        }
    }

    pub fn patience(&self) -> usize {
        self.patience
    }

    /// Inspect the last `patience + 1` validation losses, oldest first.
    /// Not evaluated until that many epochs have completed.
    pub fn should_stop(&self, val_losses: &[f64]) -> bool {
        let window_len = self.patience + 1;
        if val_losses.len() < window_len {
            return false;
        }
        let window = &val_losses[val_losses.len() - window_len..];

        match self.rule {
            EarlyStopRule::NoImprovement => {
                let reference = window[0];
                !window[1..]
                    .iter()
                    .any(|&loss| loss < reference - self.min_delta)
            }
            EarlyStopRule::StrictlyDecreasing => window.windows(2).all(|w| w[0] > w[1]),
        }
    }

    /// Record a validation loss; true when it is a new best.
    pub fn update_best(&mut self, loss: f64) -> bool {
        if loss.is_finite() && loss < self.best_loss - self.min_delta {
            self.best_loss = loss;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_for_a_full_window() {
        let es = EarlyStopping::new(3, 0.0, EarlyStopRule::NoImprovement);
        assert!(!es.should_stop(&[0.5, 0.5, 0.5]));
        assert!(es.should_stop(&[0.5, 0.5, 0.5, 0.5]));
    }

    #[test]
    fn no_improvement_rule_continues_while_improving() {
        let es = EarlyStopping::new(3, 0.0, EarlyStopRule::NoImprovement);
        assert!(!es.should_stop(&[0.5, 0.4, 0.3, 0.2]));
        assert!(!es.should_stop(&[0.5, 0.6, 0.3, 0.2]));
        assert!(es.should_stop(&[0.3, 0.5, 0.5, 0.6, 0.55]));
    }

    #[test]
    fn min_delta_requires_meaningful_improvement() {
        let es = EarlyStopping::new(2, 0.05, EarlyStopRule::NoImprovement);
        assert!(es.should_stop(&[0.50, 0.48, 0.47]));
        assert!(!es.should_stop(&[0.50, 0.48, 0.40]));
    }

    #[test]
    fn strictly_decreasing_rule_stops_on_monotone_window() {
        let es = EarlyStopping::new(3, 0.0, EarlyStopRule::StrictlyDecreasing);
        assert!(es.should_stop(&[0.5, 0.4, 0.3, 0.2]));
        assert!(!es.should_stop(&[0.5, 0.6, 0.3, 0.2]));
        assert!(!es.should_stop(&[0.5, 0.4, 0.4, 0.2]));
    }

    #[test]
    fn only_the_trailing_window_counts() {
        let es = EarlyStopping::new(2, 0.0, EarlyStopRule::StrictlyDecreasing);
        assert!(es.should_stop(&[0.1, 0.9, 0.5, 0.4]));
    }

    #[test]
    fn tracks_best_loss() {
        let mut es = EarlyStopping::new(3, 0.0, EarlyStopRule::default());
        assert!(es.update_best(0.7));
        assert!(!es.update_best(0.8));
        assert!(!es.update_best(f64::NAN));
        assert!(es.update_best(0.6));
        assert_eq!(es.best_loss, 0.6);
    }
}
