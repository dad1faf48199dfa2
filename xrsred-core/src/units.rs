//! Physical constants and unit conversions.

/// Rydberg energy in eV.
pub const RYDBERG_EV: f64 = 13.605_691_72;

/// Speed of light in atomic units (inverse fine-structure constant).
pub const SPEED_OF_LIGHT_AU: f64 = 137.035_999_76;

/// Elementary charge in C.
pub const ELEMENTARY_CHARGE: f64 = 1.602e-19;

/// Speed of light in m/s.
pub const SPEED_OF_LIGHT: f64 = 2.9979e8;

/// Planck constant in J·s.
pub const PLANCK: f64 = 6.626e-34;

/// h·c in keV·Å.
pub const HC_KEV_ANGSTROM: f64 = 12.398_419_1;

/// Lattice plane spacing of Si(311) in Å.
pub const SI_311_D_SPACING: f64 = 1.637_417_658_998_460_8;

/// keV to eV.
pub const EV_PER_KEV: f64 = 1.0e3;

/// Photon energy in keV selected by a crystal at Bragg angle `angle_deg`.
///
/// `d_spacing` is the lattice plane spacing in Å.
#[must_use]
pub fn energy_from_bragg_angle(angle_deg: f64, d_spacing: f64) -> f64 {
    HC_KEV_ANGSTROM / (2.0 * d_spacing * angle_deg.to_radians().sin())
}

/// Photon wave number in atomic units for an energy in keV.
#[must_use]
pub fn wavenumber_au(energy_kev: f64) -> f64 {
    energy_kev * EV_PER_KEV / RYDBERG_EV / 2.0 / SPEED_OF_LIGHT_AU
}

/// Photon wave number in Å⁻¹ for an energy in keV.
#[must_use]
pub fn wavenumber_inv_angstrom(energy_kev: f64) -> f64 {
    let hbar = PLANCK / (2.0 * std::f64::consts::PI);
    energy_kev * EV_PER_KEV * ELEMENTARY_CHARGE / SPEED_OF_LIGHT / hbar / 1.0e10
}
