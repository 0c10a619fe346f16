//! Raspberry Pi 40-pin header numbering
//!
//! Node addresses carry physical header pins (`gpio_29` is header pin 29).
//! The SoC addresses the same line by its BCM number.

/// GPIO-capable header pins and their BCM numbers
pub const HEADER_PINS: &[(u8, u8)] = &[
    (3, 2),
    (5, 3),
    (7, 4),
    (8, 14),
    (10, 15),
    (11, 17),
    (12, 18),
    (13, 27),
    (15, 22),
    (16, 23),
    (18, 24),
    (19, 10),
    (21, 9),
    (22, 25),
    (23, 11),
    (24, 8),
    (26, 7),
    (27, 0),
    (28, 1),
    (29, 5),
    (31, 6),
    (32, 12),
    (33, 13),
    (35, 19),
    (36, 16),
    (37, 26),
    (38, 20),
    (40, 21),
];

/// BCM number for a physical header pin, `None` for power, ground and
/// out-of-range pins
#[must_use]
pub fn bcm_for_header_pin(pin: u8) -> Option<u8> {
    HEADER_PINS
        .iter()
        .find(|(header, _)| *header == pin)
        .map(|(_, bcm)| *bcm)
}
