/// Sound engine: procedural chiptune blips via rodio.
///
/// Every effect is synthesized into an in-memory WAV buffer at start-up
/// and played fire-and-forget on its own detached Sink.
///
/// Build without the "sound" feature to get a silent stub with the same API.

use crate::sim::event::GameEvent;

/// One sound effect per audible game event.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Sfx {
    Jump,
    Copy,
    Paste,
    Reject,
    Reveal,
    Clear,
    Won,
}

impl Sfx {
    pub const ALL: [Sfx; 7] = [
        Sfx::Jump, Sfx::Copy, Sfx::Paste, Sfx::Reject, Sfx::Reveal, Sfx::Clear, Sfx::Won,
    ];

    /// Which effect (if any) an event makes.
    pub fn for_event(ev: &GameEvent) -> Option<Sfx> {
        match ev {
            GameEvent::Jumped => Some(Sfx::Jump),
            GameEvent::Copied { .. } => Some(Sfx::Copy),
            GameEvent::Pasted { .. } => Some(Sfx::Paste),
            GameEvent::PasteRejected | GameEvent::OutOfBudget => Some(Sfx::Reject),
            GameEvent::ExitRevealed { .. } => Some(Sfx::Reveal),
            GameEvent::LevelComplete { .. } => Some(Sfx::Clear),
            GameEvent::GameWon => Some(Sfx::Won),
            _ => None,
        }
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: HashMap<Sfx, Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let buffers = Sfx::ALL.iter()
                .map(|&sfx| (sfx, Arc::new(make_wav(&synth(sfx)))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let buf = match self.buffers.get(&sfx) {
                Some(b) => b,
                None => return,
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators (mono f32 samples)
    // ════════════════════════════════════════════════════════════

    fn synth(sfx: Sfx) -> Vec<f32> {
        match sfx {
            Sfx::Jump => sweep(300.0, 700.0, 0.09, 0.22),
            Sfx::Copy => arpeggio(&[(880.0, 0.04), (1320.0, 0.06)], 0.22),
            Sfx::Paste => thunk(),
            Sfx::Reject => sweep(220.0, 110.0, 0.14, 0.25),
            Sfx::Reveal => arpeggio(&[(784.0, 0.08), (1047.0, 0.15)], 0.3),
            Sfx::Clear => arpeggio(&[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.3)], 0.3),
            Sfx::Won => arpeggio(&[
                (523.0, 0.12), (659.0, 0.12), (784.0, 0.12),
                (1047.0, 0.12), (784.0, 0.12), (1047.0, 0.45),
            ], 0.3),
        }
    }

    /// Linear frequency sweep with a fading envelope.
    fn sweep(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase += (from + (to - from) * t) / SAMPLE_RATE as f32;
                (phase * TAU).sin() * (1.0 - t) * volume
            })
            .collect()
    }

    /// Notes back to back; sine + octave for a retro edge.
    fn arpeggio(notes: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in notes {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 2.0 * TAU).sin() * 0.3;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Paste: low tone plus a noise click.
    fn thunk() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.08) as usize;
        let mut rng: u32 = 0x5eed;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let tone = (ti * 140.0 * TAU).sin();
                (tone * 0.7 + noise * 0.3 * (1.0 - t).powi(4)) * (1.0 - t) * 0.35
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder (16-bit PCM mono)
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let block_align: u16 = bits_per_sample / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_size = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API (no-ops when the sound feature is off)
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

impl SoundEngine {
    /// Play whatever the tick's events call for.
    pub fn play_events(&self, events: &[GameEvent]) {
        for sfx in events.iter().filter_map(Sfx::for_event) {
            self.play(sfx);
        }
    }
}
