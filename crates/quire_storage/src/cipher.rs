//! Symmetric stream cipher for enciphered modules.
//!
//! The engine is a card-shuffle stream cipher (Sapphire II): a 256-entry
//! permutation is keyed from the module secret, then reshuffled after every
//! byte using the last plain and cipher bytes. Both directions feed the same
//! `(plain, cipher)` pair back into the state, so a fresh engine replaying
//! the bytes in the same order inverts the other direction.
//!
//! ## Hygiene
//!
//! - One engine per buffer; an engine is never reused across buffers
//! - [`CipherEngine::burn`] zeroes the permutation and registers
//! - Engines and keys are zeroized on drop

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Number of retries before `keyrand` falls back to a modulo reduction.
const KEYRAND_RETRIES: u32 = 11;

/// Secret bytes that unlock an enciphered module.
///
/// The bytes are zeroized when the key is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CipherKey {
    bytes: Vec<u8>,
}

impl CipherKey {
    /// Creates a key from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Returns the key bytes.
    ///
    /// Don't log or serialize the result.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns true if the key has no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<&str> for CipherKey {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Stateful byte-stream cipher.
///
/// Every transformed byte advances the internal state, so bytes must be
/// deciphered in the order they were enciphered.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct CipherEngine {
    cards: [u8; 256],
    rotor: u8,
    ratchet: u8,
    avalanche: u8,
    last_plain: u8,
    last_cipher: u8,
}

impl CipherEngine {
    /// Builds an engine keyed with `key`.
    ///
    /// An empty key leaves the engine in its unkeyed (hash) state.
    #[must_use]
    pub fn new(key: &[u8]) -> Self {
        let mut engine = Self {
            cards: [0u8; 256],
            rotor: 0,
            ratchet: 0,
            avalanche: 0,
            last_plain: 0,
            last_cipher: 0,
        };

        if key.is_empty() {
            engine.hash_init();
        } else {
            engine.initialize(key);
        }
        engine
    }

    fn hash_init(&mut self) {
        self.rotor = 1;
        self.ratchet = 3;
        self.avalanche = 5;
        self.last_plain = 7;
        self.last_cipher = 11;
        for (i, card) in self.cards.iter_mut().enumerate() {
            *card = 255 - i as u8;
        }
    }

    fn initialize(&mut self, key: &[u8]) {
        for (i, card) in self.cards.iter_mut().enumerate() {
            *card = i as u8;
        }

        let mut rsum = 0u8;
        let mut keypos = 0usize;
        for i in (0..256usize).rev() {
            let to_swap = self.keyrand(i as u32, key, &mut rsum, &mut keypos);
            self.cards.swap(i, usize::from(to_swap));
        }

        self.rotor = self.cards[1];
        self.ratchet = self.cards[3];
        self.avalanche = self.cards[5];
        self.last_plain = self.cards[7];
        self.last_cipher = self.cards[usize::from(rsum)];
    }

    /// Picks a pseudo-random card index in `0..=limit` driven by the key.
    fn keyrand(&self, limit: u32, key: &[u8], rsum: &mut u8, keypos: &mut usize) -> u8 {
        if limit == 0 {
            return 0;
        }

        let mut mask = 1u32;
        while mask < limit {
            mask = (mask << 1) + 1;
        }

        let mut retries = 0u32;
        loop {
            *rsum = self.cards[usize::from(*rsum)].wrapping_add(key[*keypos]);
            *keypos += 1;
            if *keypos >= key.len() {
                *keypos = 0;
                *rsum = rsum.wrapping_add(key.len() as u8);
            }

            let mut u = mask & u32::from(*rsum);
            retries += 1;
            if retries > KEYRAND_RETRIES {
                u %= limit;
            }
            if u <= limit {
                return u as u8;
            }
        }
    }

    /// Shuffles the deck once and returns the next keystream byte.
    fn next_keystream(&mut self) -> u8 {
        let c = &mut self.cards;

        self.ratchet = self.ratchet.wrapping_add(c[usize::from(self.rotor)]);
        self.rotor = self.rotor.wrapping_add(1);

        let swap = c[usize::from(self.last_cipher)];
        c[usize::from(self.last_cipher)] = c[usize::from(self.ratchet)];
        c[usize::from(self.ratchet)] = c[usize::from(self.last_plain)];
        c[usize::from(self.last_plain)] = c[usize::from(self.rotor)];
        c[usize::from(self.rotor)] = swap;

        self.avalanche = self.avalanche.wrapping_add(c[usize::from(swap)]);

        let first = c[usize::from(
            c[usize::from(self.ratchet)].wrapping_add(c[usize::from(self.rotor)]),
        )];
        let mix = c[usize::from(self.last_plain)]
            .wrapping_add(c[usize::from(self.last_cipher)])
            .wrapping_add(c[usize::from(self.avalanche)]);
        let second = c[usize::from(c[usize::from(mix)])];

        first ^ second
    }

    /// Enciphers one byte.
    pub fn encipher_byte(&mut self, plain: u8) -> u8 {
        let cipher = plain ^ self.next_keystream();
        self.last_plain = plain;
        self.last_cipher = cipher;
        cipher
    }

    /// Deciphers one byte.
    pub fn decipher_byte(&mut self, cipher: u8) -> u8 {
        let plain = cipher ^ self.next_keystream();
        self.last_plain = plain;
        self.last_cipher = cipher;
        plain
    }

    /// Zeroes the permutation and all registers.
    ///
    /// The engine must not be used afterwards.
    pub fn burn(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for CipherEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherEngine").finish_non_exhaustive()
    }
}

/// Deciphers `data` in place with a fresh engine keyed by `key`.
pub fn decipher(key: &CipherKey, data: &mut [u8]) {
    let mut engine = CipherEngine::new(key.as_bytes());
    for byte in data.iter_mut() {
        *byte = engine.decipher_byte(*byte);
    }
    engine.burn();
}

/// Enciphers `data` in place with a fresh engine keyed by `key`.
pub fn encipher(key: &CipherKey, data: &mut [u8]) {
    let mut engine = CipherEngine::new(key.as_bytes());
    for byte in data.iter_mut() {
        *byte = engine.encipher_byte(*byte);
    }
    engine.burn();
}
