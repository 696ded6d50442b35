//! String shape: contiguous character data

use crate::descriptor::Reflect;

/// A value that stores contiguous UTF-8 text
pub trait StringLike: Reflect {
    /// View the text
    fn str_view(&self) -> &str;

    /// Replace the text, returning `false` if the value is read-only
    fn assign_str(&mut self, value: &str) -> bool {
        let _ = value;
        false
    }
}

/// String capability table of one type
pub(crate) struct StringShape {
    view: unsafe fn(*const u8) -> *const str,
    assign: unsafe fn(*mut u8, &str) -> bool,
}

impl StringShape {
    pub(crate) fn of<S: StringLike>() -> Self {
        Self {
            view: view_thunk::<S>,
            assign: assign_thunk::<S>,
        }
    }

    /// # Safety
    ///
    /// `value` must point to a live value of the described type that outlives `'a`.
    pub(crate) unsafe fn view<'a>(&self, value: *const u8) -> &'a str {
        &*(self.view)(value)
    }

    /// # Safety
    ///
    /// `value` must point to a live value of the described type, exclusively held.
    pub(crate) unsafe fn assign(&self, value: *mut u8, text: &str) -> bool {
        (self.assign)(value, text)
    }
}

unsafe fn view_thunk<S: StringLike>(value: *const u8) -> *const str {
    (*value.cast::<S>()).str_view()
}

unsafe fn assign_thunk<S: StringLike>(value: *mut u8, text: &str) -> bool {
    (*value.cast::<S>()).assign_str(text)
}

#[cfg(test)]
mod tests {
    use crate::{Any, ErrorKind};

    #[test]
    fn test_string_view_and_assign() {
        let mut text = Any::new(String::from("void"));
        assert_eq!(text.as_str(), Some("void"));
        text.set_str("engine").unwrap();
        assert_eq!(text.get::<String>().map(String::as_str), Some("engine"));
    }

    #[test]
    fn test_static_str_is_read_only() {
        let mut text = Any::new("fixed");
        assert_eq!(text.as_str(), Some("fixed"));
        assert!(text.set_str("other").unwrap_err().is(ErrorKind::InvalidQualifier));
        assert_eq!(Any::new(3u8).as_str(), None);
    }
}
