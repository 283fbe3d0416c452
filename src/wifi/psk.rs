//! WPA2 pre-shared key derivation.
//!
//! The supplicant accepts a pre-computed 256-bit PSK in place of the
//! plaintext passphrase. It is derived with PBKDF2-HMAC-SHA1 using the SSID
//! as salt (IEEE 802.11i, Annex H.4).
//!
//! # Example
//!
//! ```
//! use zerostick_wifi::wifi::derive_psk;
//!
//! let psk = derive_psk("IEEE", "password");
//! assert_eq!(psk.len(), 64);
//! ```

use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use zeroize::Zeroize;

/// WPA2 PBKDF2 iteration count (IEEE 802.11i).
pub const PBKDF2_ITERATIONS: u32 = 4096;

/// Length of the derived key in bytes.
pub const PSK_LEN: usize = 32;

/// Length of the derived key as a hex string.
pub const PSK_HEX_LEN: usize = PSK_LEN * 2;

/// Derive the hex-encoded PSK for an SSID/passphrase pair.
///
/// PBKDF2 output blocks do not depend on the requested length, so the first
/// 32 bytes are identical to the prefix of any longer derivation.
pub fn derive_psk(ssid: &str, passphrase: &str) -> String {
    let mut key = [0u8; PSK_LEN];
    pbkdf2_hmac::<Sha1>(
        passphrase.as_bytes(),
        ssid.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut key,
    );
    let encoded = hex::encode(key);
    key.zeroize();
    encoded
}

/// Check that a string looks like a derived PSK (64 hex characters).
pub fn is_valid_psk(psk: &str) -> bool {
    psk.len() == PSK_HEX_LEN && psk.bytes().all(|b| b.is_ascii_hexdigit())
}
