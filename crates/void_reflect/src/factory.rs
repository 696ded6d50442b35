//! TypeFactory - fluent member registration
//!
//! A factory is bound to one type and holds the database's exclusive lock
//! for as long as it lives. Each registration call also moves the
//! attribute target, so in
//!
//! ```ignore
//! TypeInfo::reflect::<Point>()
//!     .constant("ORIGIN", Point::default())
//!     .attribute(Doc("the origin"));
//! ```
//!
//! the `Doc` attribute lands on the constant, not on `Point`. Constructors,
//! parents and conversions move the target back to the type itself.

use core::marker::PhantomData;

use parking_lot::RwLockWriteGuard;

use crate::any::Any;
use crate::attribute::Attributes;
use crate::database::Registry;
use crate::descriptor::Reflect;
use crate::function::IntoFunction;
use crate::guard::GuardedMut;
use crate::member::{ConstantInfo, Conversion, Members, ParentCast, PropertyInfo};
use crate::type_data::TypeData;
use crate::type_info::TypeInfo;

/// Where the next `attribute` call lands
#[derive(Clone, Debug, PartialEq, Eq)]
enum AttributeTarget {
    Type,
    Constant(String),
    Property(String),
    Function(String, usize),
}

/// Builder that registers members of `T`
pub struct TypeFactory<'a, T: Reflect> {
    data: &'static TypeData,
    registry: GuardedMut<'a, Registry>,
    target: AttributeTarget,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Reflect> TypeFactory<'a, T> {
    pub(crate) fn new(data: &'static TypeData, registry: GuardedMut<'a, Registry>) -> Self {
        Self {
            data,
            registry,
            target: AttributeTarget::Type,
            _marker: PhantomData,
        }
    }

    /// The type being registered
    pub fn info(&self) -> TypeInfo {
        TypeInfo::from_data(self.data)
    }

    /// Register a named constant
    pub fn constant<V: Reflect>(&mut self, name: &str, value: V) -> &mut Self {
        let constant = ConstantInfo::new(name, Any::new(value));
        if self.members().constants.insert(name.to_string(), constant).is_some() {
            log::warn!("Constant '{}::{}' replaced", self.data.name(), name);
        }
        self.target = AttributeTarget::Constant(name.to_string());
        self
    }

    /// Register a read-only property
    pub fn property<V, G>(&mut self, name: &str, get: G) -> &mut Self
    where
        V: Reflect,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.insert_property(name, PropertyInfo::new::<T, V, G>(name, get))
    }

    /// Register a property with a setter
    pub fn property_rw<V, G, S>(&mut self, name: &str, get: G, set: S) -> &mut Self
    where
        V: Reflect + Clone,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.insert_property(name, PropertyInfo::new::<T, V, G>(name, get).with_setter::<T, V, S>(set))
    }

    fn insert_property(&mut self, name: &str, property: PropertyInfo) -> &mut Self {
        if self.members().properties.insert(name.to_string(), property).is_some() {
            log::warn!("Property '{}::{}' replaced", self.data.name(), name);
        }
        self.target = AttributeTarget::Property(name.to_string());
        self
    }

    /// Add an overload to a named function
    pub fn function<M, F>(&mut self, name: &str, function: F) -> &mut Self
    where
        F: IntoFunction<M>,
    {
        let index = self.members().add_function(name, function.into_overload());
        self.target = AttributeTarget::Function(name.to_string(), index);
        self
    }

    /// Register a constructor
    pub fn constructor<M, F>(&mut self, constructor: F) -> &mut Self
    where
        F: IntoFunction<M, Output = T>,
    {
        self.members().constructors.push(constructor.into_overload());
        self.target = AttributeTarget::Type;
        self
    }

    /// Declare `B` as a parent reachable through the given projections
    pub fn parent<B, U, M>(&mut self, upcast: U, upcast_mut: M) -> &mut Self
    where
        B: Reflect,
        U: Fn(&T) -> &B + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut B + Send + Sync + 'static,
    {
        self.members().parents.push(ParentCast::new::<T, B, U, M>(upcast, upcast_mut));
        self.target = AttributeTarget::Type;
        self
    }

    /// Declare a value conversion to `U`; later declarations win
    pub fn conversion<U, F>(&mut self, convert: F) -> &mut Self
    where
        U: Reflect,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        self.members().conversions.push(Conversion::new::<T, U, F>(convert));
        self.target = AttributeTarget::Type;
        self
    }

    /// Attach an attribute to the current target
    pub fn attribute<A: Reflect>(&mut self, value: A) -> &mut Self {
        let target = self.target.clone();
        let mut members = self.data.members_mut();
        let attributes: Option<&mut Attributes> = match &target {
            AttributeTarget::Type => Some(&mut members.attributes),
            AttributeTarget::Constant(name) => members
                .constants
                .get_mut(name)
                .map(ConstantInfo::attributes_mut),
            AttributeTarget::Property(name) => members
                .properties
                .get_mut(name)
                .map(PropertyInfo::attributes_mut),
            AttributeTarget::Function(name, index) => members
                .functions
                .get_mut(name)
                .and_then(|overloads| overloads.get_mut(*index))
                .map(|overload| overload.attributes_mut()),
        };
        let Some(attributes) = attributes else {
            log::warn!("Attribute target {:?} of '{}' vanished", target, self.data.name());
            return self;
        };
        let key = attributes.insert(value);
        drop(members);

        if target == AttributeTarget::Type {
            let info = self.info();
            self.registry.index_attribute(&key, info);
        }
        self
    }

    fn members(&self) -> RwLockWriteGuard<'static, Members> {
        self.data.members_mut()
    }
}

impl<T: Reflect> Drop for TypeFactory<'_, T> {
    fn drop(&mut self) {
        log::debug!("Finished registering '{}'", self.data.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::TypeDatabase;
    use crate::descriptor::Descriptor;

    #[derive(Clone, Debug, PartialEq)]
    struct Note(&'static str);

    impl Reflect for Note {
        fn describe(d: &mut Descriptor<Self>) {
            d.name("factory_test::Note").copyable().comparable().debuggable();
        }
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Gauge {
        level: u32,
    }

    impl Reflect for Gauge {
        fn describe(d: &mut Descriptor<Self>) {
            d.name("factory_test::Gauge").copyable().comparable().debuggable();
        }
    }

    #[test]
    fn test_attribute_follows_target() {
        let db = TypeDatabase::new();
        db.reflect::<Gauge>()
            .attribute(Note("type"))
            .constant("FULL", Gauge { level: 100 })
            .attribute(Note("constant"))
            .property("level", |g: &Gauge| g.level)
            .attribute(Note("property"))
            .function("fill", |g: &mut Gauge| g.level = 100)
            .attribute(Note("function"))
            .constructor(|level: u32| Gauge { level })
            .attribute(Note("type again"));

        let info = TypeInfo::of::<Gauge>();
        assert_eq!(*info.get_attribute::<Note>().unwrap(), Note("type again"));
        assert_eq!(
            *info.constant("FULL").unwrap().get_attribute::<Note>().unwrap(),
            Note("constant")
        );
        assert_eq!(
            *info.property("level").unwrap().get_attribute::<Note>().unwrap(),
            Note("property")
        );
        let fill = info.function("fill").unwrap();
        assert_eq!(*fill.overloads()[0].get_attribute::<Note>().unwrap(), Note("function"));

        let indexed = db.query().with_attribute::<Note>().types();
        assert!(indexed.contains(&info));
    }
}
