/// Construct a [`Value::Map`][crate::Value::Map] from `key: value` pairs.
///
/// Keys are identifiers. A value is a nested `{ .. }` map, a `[ .. ]` list,
/// `None`, or any expression convertible with
/// [`Value::from`][crate::Value].
///
/// ```
/// let data = moustache::value! {
///     name: "Ferris",
///     crabs: [{ name: "Sally" }, { name: "Bob" }],
///     nothing: None,
/// };
/// ```
#[macro_export]
macro_rules! value {
    ($($entries:tt)*) => {
        $crate::Value::Map({
            #[allow(unused_mut)]
            let mut map = $crate::Map::new();
            $crate::_value_entries!(map; $($entries)*);
            map
        })
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! _value_entries {
    ($map:ident;) => {};

    ($map:ident; $key:ident : { $($inner:tt)* } $(, $($rest:tt)*)?) => {
        $map.insert(::std::string::String::from(stringify!($key)), $crate::value!($($inner)*));
        $crate::_value_entries!($map; $($($rest)*)?);
    };

    ($map:ident; $key:ident : [ $($items:tt)* ] $(, $($rest:tt)*)?) => {
        $map.insert(::std::string::String::from(stringify!($key)), $crate::_value_items!([] $($items)*));
        $crate::_value_entries!($map; $($($rest)*)?);
    };

    ($map:ident; $key:ident : None $(, $($rest:tt)*)?) => {
        $map.insert(::std::string::String::from(stringify!($key)), $crate::Value::None);
        $crate::_value_entries!($map; $($($rest)*)?);
    };

    ($map:ident; $key:ident : $value:expr $(, $($rest:tt)*)?) => {
        $map.insert(::std::string::String::from(stringify!($key)), $crate::Value::from($value));
        $crate::_value_entries!($map; $($($rest)*)?);
    };
}

// Accumulates converted list items inside the leading brackets.
#[macro_export]
#[doc(hidden)]
macro_rules! _value_items {
    ([$($done:expr),*]) => {
        $crate::Value::List(::std::vec![$($done),*])
    };

    ([$($done:expr),*] { $($inner:tt)* } $(, $($rest:tt)*)?) => {
        $crate::_value_items!([$($done,)* $crate::value!($($inner)*)] $($($rest)*)?)
    };

    ([$($done:expr),*] [ $($items:tt)* ] $(, $($rest:tt)*)?) => {
        $crate::_value_items!([$($done,)* $crate::_value_items!([] $($items)*)] $($($rest)*)?)
    };

    ([$($done:expr),*] None $(, $($rest:tt)*)?) => {
        $crate::_value_items!([$($done,)* $crate::Value::None] $($($rest)*)?)
    };

    ([$($done:expr),*] $item:expr $(, $($rest:tt)*)?) => {
        $crate::_value_items!([$($done,)* $crate::Value::from($item)] $($($rest)*)?)
    };
}

#[cfg(test)]
mod tests {
    use crate::{List, Map, Value};

    #[test]
    fn value_empty() {
        assert_eq!(value! {}, Value::Map(Map::new()));
    }

    #[test]
    fn value_entries() {
        let name = String::from("Ann");
        let v = value! { name: name.clone(), age: 30 + 1, nothing: None, ok: true };
        let mut exp = Map::new();
        exp.insert(String::from("name"), Value::from("Ann"));
        exp.insert(String::from("age"), Value::Integer(31));
        exp.insert(String::from("nothing"), Value::None);
        exp.insert(String::from("ok"), Value::Bool(true));
        assert_eq!(v, Value::Map(exp));
    }

    #[test]
    fn value_nested() {
        let v = value! {
            empty: [],
            items: [{ id: 1 }, [None, -2], "x",],
            inner: { deep: { flag: false } },
        };
        assert_eq!(
            v.to_string(),
            "{empty=[], inner={deep={flag=false}}, items=[{id=1}, [, -2], x]}"
        );
    }

    #[test]
    fn value_list_of_expressions() {
        let v = value! { xs: [1.5_f64, String::from("a")] };
        let mut exp = Map::new();
        exp.insert(
            String::from("xs"),
            Value::List(List::from([Value::Float(1.5), Value::from("a")])),
        );
        assert_eq!(v, Value::Map(exp));
    }
}
