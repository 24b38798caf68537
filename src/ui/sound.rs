/// Sound effects: short procedural tones, one per kind of game event.
///
/// Buffers are synthesized once at startup and played fire-and-forget
/// through rodio. Without the `sound` feature, or without an output
/// device, the engine is silent and every call is a no-op.

use crate::sim::event::GameEvent;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Correct,
    Wrong,
    Hint,
    PowerUp,
    Achievement,
    Escape,
    TimeUp,
}

impl Sfx {
    pub const ALL: [Sfx; 7] = [
        Sfx::Correct,
        Sfx::Wrong,
        Sfx::Hint,
        Sfx::PowerUp,
        Sfx::Achievement,
        Sfx::Escape,
        Sfx::TimeUp,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Which effect, if any, an event should make.
pub fn sfx_for(event: &GameEvent) -> Option<Sfx> {
    match event {
        GameEvent::CorrectAnswer { .. } => Some(Sfx::Correct),
        GameEvent::WrongAnswer { .. } => Some(Sfx::Wrong),
        GameEvent::HintRevealed { .. } => Some(Sfx::Hint),
        GameEvent::PowerUpActivated { .. } => Some(Sfx::PowerUp),
        GameEvent::AchievementUnlocked { .. } => Some(Sfx::Achievement),
        GameEvent::RoomCompleted { escaped: true, .. } => Some(Sfx::Escape),
        GameEvent::TimeUp => Some(Sfx::TimeUp),
        _ => None,
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: Vec<Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };
            let buffers = Sfx::ALL
                .iter()
                .map(|&sfx| Arc::new(make_wav(&synth(sfx))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let Some(buf) = self.buffers.get(sfx.index()) else { return };
            match Sink::try_new(&self.handle) {
                Ok(sink) => {
                    let cursor = Cursor::new(buf.as_ref().clone());
                    match rodio::Decoder::new(cursor) {
                        Ok(src) => {
                            sink.append(src);
                            sink.detach();
                        }
                        Err(e) => log::warn!("could not decode {sfx:?}: {e}"),
                    }
                }
                Err(e) => log::warn!("could not open sink for {sfx:?}: {e}"),
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Synthesis
    // ════════════════════════════════════════════════════════════

    #[derive(Clone, Copy)]
    enum Wave {
        Sine,
        /// Sine plus a third harmonic; reads as a soft square.
        Chip,
        /// Fundamental with an octave on top.
        Bell,
    }

    /// (frequency Hz, seconds)
    type Note = (f32, f32);

    fn synth(sfx: Sfx) -> Vec<f32> {
        match sfx {
            Sfx::Correct => sequence(&[(784.0, 0.06), (1047.0, 0.12)], Wave::Chip, 0.25),
            Sfx::Wrong => sequence(&[(220.0, 0.10), (185.0, 0.18)], Wave::Chip, 0.25),
            Sfx::Hint => sequence(&[(880.0, 0.08)], Wave::Sine, 0.2),
            Sfx::PowerUp => sweep(300.0, 1200.0, 0.18, 0.22),
            Sfx::Achievement => sequence(
                &[(1047.0, 0.06), (1319.0, 0.06), (1568.0, 0.06), (2093.0, 0.16)],
                Wave::Bell,
                0.22,
            ),
            Sfx::Escape => sequence(
                &[(523.0, 0.10), (659.0, 0.10), (784.0, 0.10), (1047.0, 0.30)],
                Wave::Bell,
                0.3,
            ),
            Sfx::TimeUp => sequence(
                &[(440.0, 0.14), (370.0, 0.14), (311.0, 0.14), (261.0, 0.30)],
                Wave::Sine,
                0.3,
            ),
        }
    }

    fn sample(wave: Wave, freq: f32, t: f32) -> f32 {
        let phase = t * freq * TAU;
        match wave {
            Wave::Sine => phase.sin(),
            Wave::Chip => phase.sin() * 0.7 + (phase * 3.0).sin() * 0.3,
            Wave::Bell => phase.sin() * 0.65 + (phase * 2.0).sin() * 0.35,
        }
    }

    fn sequence(notes: &[Note], wave: Wave, volume: f32) -> Vec<f32> {
        let mut out = Vec::new();
        for &(freq, secs) in notes {
            let n = (SAMPLE_RATE as f32 * secs) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.6);
                out.push(sample(wave, freq, t) * env * volume);
            }
        }
        out
    }

    /// Linear pitch glide from `from` to `to`.
    fn sweep(from: f32, to: f32, secs: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * secs) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let k = i as f32 / n as f32;
                let freq = from + (to - from) * k;
                phase += freq * TAU / SAMPLE_RATE as f32;
                phase.sin() * (1.0 - k) * volume
            })
            .collect()
    }

    /// 16-bit mono PCM in a RIFF/WAVE container.
    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut buf = Vec::with_capacity(44 + data_len as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_len).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
        buf.extend_from_slice(&2u16.to_le_bytes());
        buf.extend_from_slice(&16u16.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_len.to_le_bytes());
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn every_effect_synthesizes_audible_samples() {
            for sfx in Sfx::ALL {
                let samples = synth(sfx);
                assert!(!samples.is_empty(), "{sfx:?}");
                assert!(samples.iter().all(|s| s.abs() <= 1.0));
            }
        }

        #[test]
        fn wav_header_sizes_match_payload() {
            let wav = make_wav(&[0.0, 0.5, -0.5]);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + 6);
            assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 6);
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API (no-ops without the sound feature)
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}

/// Play whatever the events call for. At most one of each effect per batch.
pub fn play_events(engine: Option<&SoundEngine>, events: &[GameEvent]) {
    let Some(engine) = engine else { return };
    let mut played: Vec<Sfx> = Vec::new();
    for sfx in events.iter().filter_map(sfx_for) {
        if !played.contains(&sfx) {
            engine.play(sfx);
            played.push(sfx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::PowerUpKind;

    #[test]
    fn events_map_to_effects() {
        assert_eq!(
            sfx_for(&GameEvent::CorrectAnswer { puzzle_id: "p".into(), points: 10 }),
            Some(Sfx::Correct)
        );
        assert_eq!(
            sfx_for(&GameEvent::PowerUpActivated { kind: PowerUpKind::ExtraTime }),
            Some(Sfx::PowerUp)
        );
        assert_eq!(sfx_for(&GameEvent::TimeUp), Some(Sfx::TimeUp));
        assert_eq!(
            sfx_for(&GameEvent::RoomCompleted { room_id: "r".into(), escaped: false, bonus: 0 }),
            None
        );
        assert_eq!(sfx_for(&GameEvent::PowerUpExpired { kind: PowerUpKind::DoublePoints }), None);
    }

    #[test]
    fn effect_indices_follow_all_order() {
        for (i, sfx) in Sfx::ALL.iter().enumerate() {
            assert_eq!(sfx.index(), i);
        }
    }
}
