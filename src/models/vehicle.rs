//! Vehicle attribute enumerations
//!
//! Each enum carries the label the backend stores. Unknown labels decode to
//! `Other` so neither cached rows nor network payloads fail on a new value.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
            #[serde(other)]
            Other,
        }

        impl $name {
            /// Every known variant, in catalogue order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Backend label
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                    Self::Other => "Other",
                }
            }

            /// Parse a label, case-insensitively. Unknown labels map to `Other`.
            pub fn from_label(label: &str) -> Self {
                let label = label.trim();
                $(
                    if label.eq_ignore_ascii_case($label) {
                        return Self::$variant;
                    }
                )+
                Self::Other
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

labelled_enum! {
    /// Car body style
    BodyType {
        Sedan => "Sedan",
        Hatchback => "Hatchback",
        Wagon => "Wagon",
        Coupe => "Coupe",
        Convertible => "Convertible",
        Suv => "SUV",
        Minivan => "Minivan",
        Pickup => "Pickup",
    }
}

labelled_enum! {
    /// Fuel / energy source
    FuelType {
        Petrol => "Petrol",
        Diesel => "Diesel",
        Hybrid => "Hybrid",
        Electric => "Electric",
        Gas => "Gas",
    }
}

labelled_enum! {
    /// Gearbox type
    TransmissionType {
        Manual => "Manual",
        Automatic => "Automatic",
        Robotic => "Robotic",
        Variator => "Variator",
    }
}

labelled_enum! {
    /// Who is selling the car
    SellerType {
        Private => "Private",
        Dealer => "Dealer",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parsing() {
        assert_eq!(BodyType::from_label("suv"), BodyType::Suv);
        assert_eq!(FuelType::from_label(" Diesel "), FuelType::Diesel);
        assert_eq!(TransmissionType::from_label("Spaceship"), TransmissionType::Other);
    }

    #[test]
    fn test_serde_labels() {
        let json = serde_json::to_string(&BodyType::Suv).unwrap();
        assert_eq!(json, "\"SUV\"");

        let parsed: SellerType = serde_json::from_str("\"Dealer\"").unwrap();
        assert_eq!(parsed, SellerType::Dealer);

        let unknown: FuelType = serde_json::from_str("\"Hydrogen\"").unwrap();
        assert_eq!(unknown, FuelType::Other);
    }

    #[test]
    fn test_catalogue_excludes_other() {
        assert!(!BodyType::ALL.contains(&BodyType::Other));
        assert_eq!(SellerType::ALL.len(), 2);
    }
}
