//! Enum string round-trips through reflected constants
//!
//! An enum value is written as the name of the first constant of the same
//! type holding an equal underlying value, or as the underlying integer when
//! no constant matches. Reading accepts either form.

use crate::any::Any;
use crate::error::{Error, ErrorKind, Result};
use crate::type_data::EnumData;
use crate::type_info::TypeInfo;

/// Name an enum value by its registered constant, or its integer value
pub fn enum_to_string(value: &Any<'_>) -> Result<String> {
    let ptr = value.data().ok_or_else(|| Error::empty_any("enum_to_string"))?;
    let ty = value.type_info();
    let enum_data = enum_data_of(ty)?;

    let raw = (enum_data.to_underlying)(ptr);
    for constant in ty.constants() {
        if constant.type_info() != ty {
            continue;
        }
        let Some(named) = constant.value().data() else {
            continue;
        };
        if (enum_data.to_underlying)(named) == raw {
            return Ok(constant.name().to_string());
        }
    }
    Ok(format!("{:?}", raw))
}

/// Parse a constant name or an integer into a value of enum type `ty`
///
/// Integers must fit the underlying type and name a value of `ty`.
pub fn enum_from_string(ty: TypeInfo, text: &str) -> Result<Any<'static>> {
    let enum_data = enum_data_of(ty)?;

    if let Some(constant) = ty.constant(text) {
        if constant.type_info() == ty {
            return constant.value().try_clone();
        }
    }

    let parsed: i128 = text.trim().parse().map_err(|_| {
        Error::invalid_param(
            1,
            format!("'{}' is neither a constant of '{}' nor an integer", text, ty.name()),
        )
    })?;
    (enum_data.from_integer)(parsed).ok_or_else(|| {
        Error::invalid_param(1, format!("{} is not a value of '{}'", parsed, ty.name()))
    })
}

fn enum_data_of(ty: TypeInfo) -> Result<&'static EnumData> {
    ty.data()
        .and_then(|data| data.enum_data.as_ref())
        .ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidType,
                format!("'{}' is not an enum", ty.name()),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::TypeDatabase;
    use crate::descriptor::{Descriptor, Reflect};

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Channel {
        Red = 1,
        Green = 2,
        Blue = 4,
    }

    impl From<Channel> for u8 {
        fn from(channel: Channel) -> u8 {
            channel as u8
        }
    }

    impl TryFrom<u8> for Channel {
        type Error = u8;

        fn try_from(raw: u8) -> core::result::Result<Self, u8> {
            match raw {
                1 => Ok(Channel::Red),
                2 => Ok(Channel::Green),
                4 => Ok(Channel::Blue),
                other => Err(other),
            }
        }
    }

    impl Reflect for Channel {
        fn describe(d: &mut Descriptor<Self>) {
            d.name("enum_test::Channel")
                .copyable()
                .comparable()
                .debuggable()
                .enumeration::<u8>();
        }
    }

    fn register() -> TypeDatabase {
        let db = TypeDatabase::new();
        db.reflect::<Channel>()
            .constant("Red", Channel::Red)
            .constant("Green", Channel::Green);
        db
    }

    #[test]
    fn test_named_values_round_trip() {
        let _db = register();
        let green = Any::new(Channel::Green);
        assert_eq!(enum_to_string(&green).unwrap(), "Green");

        let parsed = enum_from_string(TypeInfo::of::<Channel>(), "Red").unwrap();
        assert_eq!(parsed.get::<Channel>(), Some(&Channel::Red));
    }

    #[test]
    fn test_unnamed_values_use_integers() {
        let _db = register();
        assert_eq!(enum_to_string(&Any::new(Channel::Blue)).unwrap(), "4");

        let parsed = enum_from_string(TypeInfo::of::<Channel>(), "4").unwrap();
        assert_eq!(parsed.get::<Channel>(), Some(&Channel::Blue));

        let err = enum_from_string(TypeInfo::of::<Channel>(), "3").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParam(1));
        let err = enum_from_string(TypeInfo::of::<Channel>(), "Purple").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParam(1));
    }

    #[test]
    fn test_out_of_range_integers_are_rejected() {
        let _db = register();
        let channel = TypeInfo::of::<Channel>();
        for text in ["257", "-255", "513", "-1", "340282366920938463463374607431768211456"] {
            let err = enum_from_string(channel, text).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidParam(1), "{}", text);
        }
        let parsed = enum_from_string(channel, " 2 ").unwrap();
        assert_eq!(parsed.get::<Channel>(), Some(&Channel::Green));
    }

    #[test]
    fn test_non_enum_is_rejected() {
        let err = enum_to_string(&Any::new(5i32)).unwrap_err();
        assert!(err.is(ErrorKind::InvalidType));
        assert!(enum_from_string(TypeInfo::of::<i32>(), "5").is_err());
    }
}
