use std::time::Duration;

/// Timing of the LED fade cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeProfile {
    pub fade_in: Duration,
    pub fade_out: Duration,
    pub step: Duration,
}

impl Default for FadeProfile {
    fn default() -> Self {
        Self {
            fade_in: Duration::from_secs(1),
            fade_out: Duration::from_secs(1),
            step: Duration::from_millis(40),
        }
    }
}

impl FadeProfile {
    pub fn period(&self) -> Duration {
        self.fade_in + self.fade_out
    }

    /// Duty cycle in `0.0..=1.0` at `elapsed` since the pulse started:
    /// a linear ramp up over `fade_in`, then down over `fade_out`, repeating.
    pub fn duty_at(&self, elapsed: Duration) -> f64 {
        let period = self.period().as_secs_f64();
        if period <= 0.0 {
            return 1.0;
        }

        let phase = elapsed.as_secs_f64() % period;
        let fade_in = self.fade_in.as_secs_f64();
        let duty = if phase < fade_in {
            phase / fade_in
        } else {
            1.0 - (phase - fade_in) / self.fade_out.as_secs_f64()
        };
        duty.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn ramps_up_then_down() {
        let profile = FadeProfile::default();
        assert!(close(profile.duty_at(Duration::ZERO), 0.0));
        assert!(close(profile.duty_at(Duration::from_millis(500)), 0.5));
        assert!(close(profile.duty_at(Duration::from_millis(1_000)), 1.0));
        assert!(close(profile.duty_at(Duration::from_millis(1_500)), 0.5));
    }

    #[test]
    fn repeats_every_period() {
        let profile = FadeProfile::default();
        let early = profile.duty_at(Duration::from_millis(250));
        let later = profile.duty_at(Duration::from_millis(250) + profile.period() * 3);
        assert!(close(early, later));
    }

    #[test]
    fn asymmetric_fades() {
        let profile = FadeProfile {
            fade_in: Duration::from_millis(200),
            fade_out: Duration::from_millis(800),
            step: Duration::from_millis(10),
        };
        assert!(close(profile.duty_at(Duration::from_millis(100)), 0.5));
        assert!(close(profile.duty_at(Duration::from_millis(600)), 0.5));
    }

    #[test]
    fn zero_period_stays_lit() {
        let profile = FadeProfile {
            fade_in: Duration::ZERO,
            fade_out: Duration::ZERO,
            step: Duration::from_millis(10),
        };
        assert_eq!(profile.duty_at(Duration::from_secs(3)), 1.0);
    }
}
