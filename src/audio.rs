//! Sound effect hooks
//!
//! The engine only says *which* sound to play. Playback belongs to an
//! [`AudioSink`]; in the browser that is [`WebAudio`], which synthesises every
//! effect with Web Audio oscillators (no sample files needed). Each effect is
//! described as a list of [`Tone`]s so the cues can be inspected natively.

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// A bubble touched something for the first time
    Drop,
    /// Two bubbles fused
    Fusion,
    /// Bomb timers counted down
    BombTick,
    /// A bomb detonated
    BombExplode,
    /// A clock froze the board
    ClockStart,
    /// Run ended
    GameOver,
}

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One oscillator note inside an effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub wave: Wave,
    /// Starting pitch in Hz
    pub freq: f32,
    /// Pitch reached at the end of the note
    pub glide_to: Option<f32>,
    /// Seconds after the effect is triggered
    pub delay: f64,
    /// Fade-in time
    pub attack: f64,
    /// Note length including the fade-out
    pub length: f64,
    /// Peak gain before volume settings
    pub peak: f32,
}

impl Tone {
    const fn new(wave: Wave, freq: f32, length: f64, peak: f32) -> Self {
        Self {
            wave,
            freq,
            glide_to: None,
            delay: 0.0,
            attack: 0.005,
            length,
            peak,
        }
    }

    const fn glide(mut self, to: f32) -> Self {
        self.glide_to = Some(to);
        self
    }

    const fn after(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    const fn attack(mut self, attack: f64) -> Self {
        self.attack = attack;
        self
    }

    pub fn end(&self) -> f64 {
        self.delay + self.length
    }
}

/// Minor arpeggio walking down from A4, the last note sagging
const GAME_OVER_NOTES: [f32; 4] = [440.0, 349.23, 293.66, 220.0];
const GAME_OVER_STEP: f64 = 0.18;

impl SoundEffect {
    /// Notes making up the effect; `pitch` shifts the drop and fusion takes
    pub fn tones(self, pitch: f32) -> Vec<Tone> {
        match self {
            SoundEffect::Drop => vec![
                Tone::new(Wave::Sine, 180.0 * pitch, 0.14, 0.4).glide(90.0 * pitch),
            ],
            SoundEffect::Fusion => vec![
                Tone::new(Wave::Sine, 500.0 * pitch, 0.11, 0.5).glide(900.0 * pitch),
                Tone::new(Wave::Triangle, 1000.0 * pitch, 0.08, 0.15).after(0.03),
            ],
            SoundEffect::BombTick => vec![Tone::new(Wave::Square, 1000.0, 0.035, 0.2)],
            SoundEffect::BombExplode => vec![
                Tone::new(Wave::Sawtooth, 120.0, 0.48, 0.5).glide(30.0),
                Tone::new(Wave::Square, 1500.0, 0.12, 0.2),
            ],
            SoundEffect::ClockStart => vec![
                Tone::new(Wave::Triangle, 880.0, 0.28, 0.3),
                Tone::new(Wave::Triangle, 660.0, 0.28, 0.3).after(0.15),
            ],
            SoundEffect::GameOver => {
                let last = GAME_OVER_NOTES.len() - 1;
                GAME_OVER_NOTES
                    .iter()
                    .enumerate()
                    .map(|(i, &freq)| {
                        let tone = Tone::new(Wave::Triangle, freq, 0.35, 0.28)
                            .after(i as f64 * GAME_OVER_STEP)
                            .attack(0.03);
                        if i == last {
                            Tone { length: 0.9, ..tone.glide(freq * 0.89) }
                        } else {
                            tone
                        }
                    })
                    .collect()
            }
        }
    }
}

/// Playback backend
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);

    /// Free backend resources; called once when the engine is destroyed
    fn release(&mut self) {}
}

/// Records effects instead of playing them (headless runs)
#[derive(Debug, Clone, Default)]
pub struct SoundLog {
    pub played: Vec<SoundEffect>,
}

impl SoundLog {
    pub fn count(&self, effect: SoundEffect) -> usize {
        self.played.iter().filter(|&&e| e == effect).count()
    }
}

impl AudioSink for SoundLog {
    fn play(&mut self, effect: SoundEffect) {
        log::trace!("sound: {:?}", effect);
        self.played.push(effect);
    }
}

/// Shared sink, so the host can inspect what the engine played
impl<T: AudioSink> AudioSink for std::rc::Rc<std::cell::RefCell<T>> {
    fn play(&mut self, effect: SoundEffect) {
        self.borrow_mut().play(effect);
    }

    fn release(&mut self) {
        self.borrow_mut().release();
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, OscillatorType};

    use super::{AudioSink, SoundEffect, Tone, Wave};
    use crate::config::AudioSettings;

    /// Silence floor for exponential fades (they cannot reach zero)
    const FADE_FLOOR: f32 = 0.001;

    impl From<Wave> for OscillatorType {
        fn from(wave: Wave) -> Self {
            match wave {
                Wave::Sine => OscillatorType::Sine,
                Wave::Square => OscillatorType::Square,
                Wave::Sawtooth => OscillatorType::Sawtooth,
                Wave::Triangle => OscillatorType::Triangle,
            }
        }
    }

    /// Web Audio backend
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        settings: AudioSettings,
    }

    impl WebAudio {
        pub fn new(settings: AudioSettings) -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx, settings }
        }

        pub fn set_settings(&mut self, settings: AudioSettings) {
            self.settings = settings;
        }

        /// Drops and fusions alternate between two takes
        fn pitch(effect: SoundEffect) -> f32 {
            match effect {
                SoundEffect::Drop | SoundEffect::Fusion if js_sys::Math::random() >= 0.5 => 1.12,
                _ => 1.0,
            }
        }

        /// Schedule one note: linear fade-in, exponential fade-out, optional glide
        fn schedule(ctx: &AudioContext, tone: &Tone, vol: f32) -> Option<()> {
            let osc = ctx.create_oscillator().ok()?;
            let amp = ctx.create_gain().ok()?;
            osc.set_type(tone.wave.into());
            osc.connect_with_audio_node(&amp).ok()?;
            amp.connect_with_audio_node(&ctx.destination()).ok()?;

            let start = ctx.current_time() + tone.delay;
            let end = start + tone.length;
            let freq = osc.frequency();
            freq.set_value_at_time(tone.freq, start).ok()?;
            if let Some(to) = tone.glide_to {
                freq.exponential_ramp_to_value_at_time(to, end).ok()?;
            }
            let level = amp.gain();
            level.set_value_at_time(0.0, start).ok()?;
            level
                .linear_ramp_to_value_at_time(tone.peak * vol, start + tone.attack)
                .ok()?;
            level.exponential_ramp_to_value_at_time(FADE_FLOOR, end).ok()?;

            osc.start_with_when(start).ok()?;
            osc.stop_with_when(end + 0.02).ok()?;
            Some(())
        }
    }

    impl AudioSink for WebAudio {
        fn play(&mut self, effect: SoundEffect) {
            let vol = self.settings.effective_volume();
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Browsers keep the context suspended until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            for tone in effect.tones(Self::pitch(effect)) {
                if Self::schedule(ctx, &tone, vol).is_none() {
                    log::debug!("Could not schedule {:?} note", effect);
                    break;
                }
            }
        }

        fn release(&mut self) {
            if let Some(ctx) = self.ctx.take() {
                let _ = ctx.close();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sound_log_counts() {
        let mut sounds = SoundLog::default();
        sounds.play(SoundEffect::Drop);
        sounds.play(SoundEffect::Fusion);
        sounds.play(SoundEffect::Drop);
        assert_eq!(sounds.count(SoundEffect::Drop), 2);
        assert_eq!(sounds.count(SoundEffect::GameOver), 0);
    }

    #[test]
    fn test_every_effect_has_audible_notes() {
        let effects = [
            SoundEffect::Drop,
            SoundEffect::Fusion,
            SoundEffect::BombTick,
            SoundEffect::BombExplode,
            SoundEffect::ClockStart,
            SoundEffect::GameOver,
        ];
        for effect in effects {
            let tones = effect.tones(1.0);
            assert!(!tones.is_empty(), "{effect:?}");
            assert!(tones.iter().all(|t| t.peak > 0.0 && t.attack < t.length));
        }
    }

    #[test]
    fn test_game_over_is_a_falling_arpeggio() {
        let tones = SoundEffect::GameOver.tones(1.0);
        assert_eq!(tones.len(), 4);
        assert!(tones.iter().all(|t| t.wave == Wave::Triangle));
        assert!(tones.windows(2).all(|w| w[1].freq < w[0].freq && w[1].delay > w[0].delay));
        // The last note rings out and sags in pitch
        let last = tones[3];
        assert!(last.glide_to.unwrap() < last.freq);
        assert!(tones.iter().all(|t| t.end() <= last.end()));
    }

    #[test]
    fn test_pitch_scales_drop_take() {
        let low = SoundEffect::Drop.tones(1.0)[0];
        let high = SoundEffect::Drop.tones(1.12)[0];
        assert!(high.freq > low.freq);
        assert_eq!(SoundEffect::BombTick.tones(1.12), SoundEffect::BombTick.tones(1.0));
    }
}
