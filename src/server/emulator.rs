use std::{convert::Infallible, future};

use rand::Rng as _;

use crate::frame::{AccessMode, Command, DeviceCode, Request, Response, Word};

use super::Service;

/// Every byte of a bit-read payload: both nibbles ON.
pub const ALL_POINTS_ON: u8 = 0x11;

/// Bounds of the synthesized word range, chosen so a dashboard polling
/// the fake device shows visibly fluctuating values.
const WORD_MIN: Word = 100;
const WORD_MAX: Word = 200;

/// Source of synthesized word values.
///
/// Injected into [`Emulator`] so tests can pin the generated data and
/// assert exact reply bytes.
pub trait WordSource: Send + Sync {
    fn next_word(&self) -> Word;
}

/// Uniformly random words in a closed range.
#[derive(Debug, Clone)]
pub struct UniformWords {
    min: Word,
    max: Word,
}

impl UniformWords {
    #[must_use]
    pub const fn new(min: Word, max: Word) -> Self {
        Self { min, max }
    }
}

impl Default for UniformWords {
    fn default() -> Self {
        Self::new(WORD_MIN, WORD_MAX)
    }
}

impl WordSource for UniformWords {
    fn next_word(&self) -> Word {
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

/// The stand-in device. Reads return freshly synthesized data, writes
/// are acknowledged and discarded; no memory survives across requests.
///
/// Unknown commands get an empty success reply rather than an error
/// end-code. Client software polls this emulator in a request/reply
/// lockstep and must never be left waiting, even when it sends a
/// command the emulator does not model.
#[derive(Debug, Default)]
pub struct Emulator<G = UniformWords> {
    words: G,
}

impl Emulator<UniformWords> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<G: WordSource> Emulator<G> {
    pub fn with_word_source(words: G) -> Self {
        Self { words }
    }
}

impl<G: WordSource> Service for Emulator<G> {
    type Request = Request;
    type Response = Response;
    type Exception = Infallible;
    type Future = future::Ready<Result<Response, Infallible>>;

    fn call(&self, req: Request) -> Self::Future {
        let device = device_label(req.device_code);
        let response = match (req.command, req.mode) {
            (Command::Read, AccessMode::Word) => {
                log::info!("Read word request (dev: {device}, count: {})", req.points);
                Response::ReadWords((0..req.points).map(|_| self.words.next_word()).collect())
            }
            (Command::Read, AccessMode::Bit) => {
                log::info!("Read bit request (dev: {device}, count: {})", req.points);
                let byte_count = (req.points as usize + 1) / 2;
                Response::ReadBits(vec![ALL_POINTS_ON; byte_count])
            }
            (Command::Read, AccessMode::Other(sub)) => {
                log::warn!("Read with unrecognized subcommand 0x{sub:02X}, replying empty");
                Response::Empty()
            }
            (Command::Write, mode) => {
                log::info!(
                    "{} write request (dev: {device}, count: {})",
                    mode,
                    req.points
                );
                Response::WriteAck()
            }
            (Command::Unknown(lo, hi), _) => {
                log::warn!("Unknown command 0x{lo:02X} 0x{hi:02X}, replying empty");
                Response::Empty()
            }
        };
        future::ready(Ok(response))
    }
}

fn device_label(code: u8) -> String {
    match DeviceCode::from_code(code) {
        Some(device) => format!("{device}/0x{code:02X}"),
        None => format!("0x{code:02X}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Quantity;

    /// Always yields the same word, so reply bytes are exact.
    struct FixedWords(Word);

    impl WordSource for FixedWords {
        fn next_word(&self) -> Word {
            self.0
        }
    }

    fn read_request(mode: AccessMode, points: Quantity) -> Request {
        Request {
            command: Command::Read,
            mode,
            device_code: DeviceCode::D.code(),
            points,
        }
    }

    #[tokio::test]
    async fn word_read_yields_one_word_per_point() {
        let emulator = Emulator::with_word_source(FixedWords(142));
        let response = emulator
            .call(read_request(AccessMode::Word, 3))
            .await
            .unwrap();
        assert_eq!(response, Response::ReadWords(vec![142, 142, 142]));
        assert_eq!(response.payload_len(), 6);
    }

    #[tokio::test]
    async fn word_read_of_zero_points_is_empty() {
        let emulator = Emulator::with_word_source(FixedWords(142));
        let response = emulator
            .call(read_request(AccessMode::Word, 0))
            .await
            .unwrap();
        assert_eq!(response, Response::ReadWords(vec![]));
    }

    #[tokio::test]
    async fn random_words_stay_in_range() {
        let emulator = Emulator::new();
        for _ in 0..100 {
            let response = emulator
                .call(read_request(AccessMode::Word, 16))
                .await
                .unwrap();
            let Response::ReadWords(words) = response else {
                panic!("expected a word reply");
            };
            assert_eq!(words.len(), 16);
            assert!(words.iter().all(|w| (100..=200).contains(w)));
        }
    }

    #[tokio::test]
    async fn bit_read_packs_two_points_per_byte() {
        let emulator = Emulator::new();
        for (points, bytes) in [(0u16, 0usize), (1, 1), (2, 1), (3, 2), (8, 4), (9, 5)] {
            let response = emulator
                .call(read_request(AccessMode::Bit, points))
                .await
                .unwrap();
            assert_eq!(response, Response::ReadBits(vec![ALL_POINTS_ON; bytes]));
        }
    }

    #[tokio::test]
    async fn writes_are_acknowledged_without_state() {
        let emulator = Emulator::new();
        for mode in [AccessMode::Word, AccessMode::Bit, AccessMode::Other(0x7F)] {
            let response = emulator
                .call(Request {
                    command: Command::Write,
                    mode,
                    device_code: DeviceCode::Y.code(),
                    points: 4,
                })
                .await
                .unwrap();
            assert_eq!(response, Response::WriteAck());
        }
    }

    #[tokio::test]
    async fn unknown_command_fails_open() {
        let emulator = Emulator::new();
        let response = emulator
            .call(Request {
                command: Command::Unknown(0x09, 0x09),
                mode: AccessMode::Word,
                device_code: 0,
                points: 7,
            })
            .await
            .unwrap();
        assert_eq!(response, Response::Empty());
    }

    #[tokio::test]
    async fn unrecognized_read_subcommand_is_a_no_op() {
        let emulator = Emulator::new();
        let response = emulator
            .call(read_request(AccessMode::Other(0x02), 5))
            .await
            .unwrap();
        assert_eq!(response, Response::Empty());
    }

    #[tokio::test]
    async fn consecutive_reads_are_independent() {
        let emulator = Emulator::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            let Response::ReadWords(words) = emulator
                .call(read_request(AccessMode::Word, 4))
                .await
                .unwrap()
            else {
                panic!("expected a word reply");
            };
            seen.insert(words);
        }
        // 50 draws of 4 words over a 101-value range collide rarely;
        // identical replies every time would mean the source is stuck.
        assert!(seen.len() > 1);
    }
}
