macro_rules! setter {
    (opt $field:ident : $ty:ty) => {
        pub fn $field<V>(mut self, $field: V) -> Self
        where
            V: Into<$ty>,
        {
            self.$field = std::option::Option::Some($field.into());
            self
        }
    };
}

pub(crate) use setter;
