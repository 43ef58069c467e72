//! Physical quantities used throughout the reconstruction chain.
//!
//! Lengths, times and speeds are `uom` quantities in a millimetre /
//! nanosecond system: detector times of arrival are recorded in ns and
//! geometry in mm, so both round-trip through the base unit exactly.
//!
//! Energies are deliberately *not* `uom` quantities (see [`todo`]).

pub mod todo;

pub use uom;

pub mod mmns {

  pub mod f32 {
    use uom::{ISQ, system};
    ISQ!(uom::si, f32, (millimeter, kilogram, nanosecond, ampere, kelvin, mole, candela));
  }

}

pub use uom::si::Quantity;
pub use mmns::f32::{Length, Time, Velocity, Ratio};

mod units {
  pub use uom::si::{length  ::{micrometer, millimeter, centimeter},
                    time    ::{nanosecond, picosecond, microsecond},
                    velocity::meter_per_second,
                    ratio   ::ratio,
  };
}

// Making values from float literals is very long-winded, so provide some
// pithily-named convenience constructors.

/// Generate a function called NAME which returns QUANTITY by interpreting its
/// argument as UNIT
///
/// wrap!(NAME QUANTITY UNIT);
macro_rules! wrap {
  ($name:ident $quantity:ident $unit:ident ) => {
    pub fn $name(x: f32) -> $quantity { $quantity::new::<units::$unit>(x) }
  };
}

wrap!(cm     Length         centimeter);
wrap!(mm     Length         millimeter);
wrap!(um     Length         micrometer);
wrap!(ns     Time           nanosecond);
wrap!(ps     Time           picosecond);
wrap!(us     Time          microsecond);
wrap!(m_s    Velocity meter_per_second);
wrap!(ratio  Ratio               ratio);

// Reverse direction of the above.
pub fn mm_(x: Length) -> f32 { x.get::<units::millimeter>() }
pub fn cm_(x: Length) -> f32 { x.get::<units::centimeter>() }
pub fn ns_(x: Time  ) -> f32 { x.get::<units::nanosecond>() }
pub fn m_s_(x: Velocity) -> f32 { x.get::<units::meter_per_second>() }
pub fn ratio_(x: Ratio) -> f32 { x.get::<units::ratio>() }

// uom has no mm/ns unit, but it is the base unit of this system
pub fn mm_ns (x: f32) -> Velocity { in_base_unit!(x) }
pub fn mm_ns_(x: Velocity) -> f32 { x.value }

#[macro_export]
macro_rules! in_base_unit {
  ($value:expr) => {
    $crate::Quantity {
      dimension: std::marker::PhantomData,
      units: std::marker::PhantomData,
      value: $value,
    }
  };
}

#[macro_export]
macro_rules! assert_uom_eq {
  ($unit:ident, $lhs:expr, $rhs:expr, $algo:ident <= $tol:expr) => {
    float_eq::assert_float_eq!($lhs.get::<$unit>(), $rhs.get::<$unit>(), $algo <= $tol)
  };
}
