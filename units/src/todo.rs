/// Units which are simply type aliases for `f32` rather than having an
/// implementation as a `uom` `Quantity`.
///
/// Energies live here: in a mm/ns base system one keV is of order 1e-28 base
/// units, and the squared energies in the Compton kinematics underflow `f32`.
/// Record fields use these aliases so that the source still says what they
/// represent.

pub type Timef32   = f32;
pub type Energyf32 = f32; // keV in pixel data, MeV in kinematics
