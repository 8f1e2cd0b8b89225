//! Element types a `Tensor` can hold.
use crate::tensor::litteral::tensor0;
use crate::tensor::{Storage, Tensor};
use half::f16;
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum DatumType {
    Bool,
    U8,
    I8,
    I32,
    I64,
    F16,
    F32,
    F64,
}

impl fmt::Display for DatumType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

pub trait Datum:
    Copy + Clone + Send + Sync + fmt::Debug + fmt::Display + Default + 'static + PartialEq
{
    fn datum_type() -> DatumType;

    #[doc(hidden)]
    fn storage(storage: &Storage) -> Option<&[Self]>;
    #[doc(hidden)]
    fn storage_mut(storage: &mut Storage) -> Option<&mut [Self]>;
    #[doc(hidden)]
    fn into_storage(data: Vec<Self>) -> Storage;
}

macro_rules! datum {
    ($t:ty, $v:ident) => {
        impl From<$t> for Tensor {
            fn from(it: $t) -> Tensor {
                tensor0(it)
            }
        }

        impl Datum for $t {
            fn datum_type() -> DatumType {
                DatumType::$v
            }

            fn storage(storage: &Storage) -> Option<&[Self]> {
                if let Storage::$v(v) = storage {
                    Some(v.as_slice())
                } else {
                    None
                }
            }

            fn storage_mut(storage: &mut Storage) -> Option<&mut [Self]> {
                if let Storage::$v(v) = storage {
                    Some(v.as_mut_slice())
                } else {
                    None
                }
            }

            fn into_storage(data: Vec<Self>) -> Storage {
                Storage::$v(data)
            }
        }
    };
}

datum!(bool, Bool);
datum!(u8, U8);
datum!(i8, I8);
datum!(i32, I32);
datum!(i64, I64);
datum!(f16, F16);
datum!(f32, F32);
datum!(f64, F64);
