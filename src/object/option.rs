/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 声明式选项注册表：每个类型声明一次其可配置/可学习字段，
 *                 之后即可按名字以字符串读写、枚举、序列化，而与字段的具体类型无关
 */

use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use super::dialect;
use super::error::ObjectError;
use super::value::{OptionType, OptionValue};

/// 选项标志，只影响元行为（是否持久化、何时可设置），从不改变字段的存储
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OptionFlags(u8);

impl OptionFlags {
    pub const NONE: Self = Self(0);
    /// 训练前配置、build 时读取
    pub const BUILD: Self = Self(1);
    /// 只在训练后才有意义（如学到的参数）
    pub const LEARNT: Self = Self(1 << 1);
    /// 不写入序列化文本
    pub const NOSAVE: Self = Self(1 << 2);
    /// 已废弃，仍可读写但不再序列化
    pub const DEPRECATED: Self = Self(1 << 3);
    /// 需要传给远端副本（如并行测试的工作者）
    pub const REMOTE_TRANSMIT: Self = Self(1 << 4);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// 是否应出现在序列化文本中（`include_learnt`指示对象当前是否已有学到的状态）
    pub const fn is_saved(self, include_learnt: bool) -> bool {
        if self.contains(Self::NOSAVE) || self.contains(Self::DEPRECATED) {
            return false;
        }
        !self.contains(Self::LEARNT) || include_learnt
    }
}

impl BitOr for OptionFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

type Getter<T> = Arc<dyn Fn(&T) -> OptionValue + Send + Sync>;
type Setter<T> = Arc<dyn Fn(&mut T, &OptionValue) -> Result<(), String> + Send + Sync>;

/// 一条选项绑定：名字 + 字段访问器 + 标志 + 说明
pub struct OptionDescriptor<T> {
    name: &'static str,
    getter: Getter<T>,
    setter: Setter<T>,
    flags: OptionFlags,
    doc: &'static str,
}

impl<T> Clone for OptionDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            getter: Arc::clone(&self.getter),
            setter: Arc::clone(&self.setter),
            flags: self.flags,
            doc: self.doc,
        }
    }
}

impl<T> fmt::Debug for OptionDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionDescriptor")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("doc", &self.doc)
            .finish()
    }
}

impl<T> OptionDescriptor<T> {
    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn flags(&self) -> OptionFlags {
        self.flags
    }

    pub const fn doc(&self) -> &'static str {
        self.doc
    }

    pub fn get(&self, obj: &T) -> OptionValue {
        (self.getter)(obj)
    }

    pub fn set(&self, obj: &mut T, value: &OptionValue) -> Result<(), String> {
        (self.setter)(obj, value)
    }
}

/// 某个具体类型的选项表
pub struct OptionRegistry<T> {
    class_name: &'static str,
    options: Vec<OptionDescriptor<T>>,
}

impl<T: 'static> OptionRegistry<T> {
    pub const fn new(class_name: &'static str) -> Self {
        Self {
            class_name,
            options: Vec::new(),
        }
    }

    pub const fn class_name(&self) -> &'static str {
        self.class_name
    }

    /// 声明一个直接绑定到字段的选项；同名重复声明说明代码有误，直接panic
    pub fn declare_option<V: OptionType + 'static>(
        &mut self,
        name: &'static str,
        field: fn(&T) -> &V,
        field_mut: fn(&mut T) -> &mut V,
        flags: OptionFlags,
        doc: &'static str,
    ) -> &mut Self {
        if let Err(e) = self.try_declare_option(name, field, field_mut, flags, doc) {
            panic!("{e}");
        }
        self
    }

    pub fn try_declare_option<V: OptionType + 'static>(
        &mut self,
        name: &'static str,
        field: fn(&T) -> &V,
        field_mut: fn(&mut T) -> &mut V,
        flags: OptionFlags,
        doc: &'static str,
    ) -> Result<(), ObjectError> {
        self.try_declare_with(
            name,
            move |obj: &T| field(obj).to_option_value(),
            move |obj: &mut T, value: &OptionValue| {
                *field_mut(obj) = V::from_option_value(value)?;
                Ok(())
            },
            flags,
            doc,
        )
    }

    /// 用任意的读/写闭包声明选项（用于并非简单字段的选项，如学到的参数）
    pub fn declare_with<G, S>(
        &mut self,
        name: &'static str,
        getter: G,
        setter: S,
        flags: OptionFlags,
        doc: &'static str,
    ) -> &mut Self
    where
        G: Fn(&T) -> OptionValue + Send + Sync + 'static,
        S: Fn(&mut T, &OptionValue) -> Result<(), String> + Send + Sync + 'static,
    {
        if let Err(e) = self.try_declare_with(name, getter, setter, flags, doc) {
            panic!("{e}");
        }
        self
    }

    pub fn try_declare_with<G, S>(
        &mut self,
        name: &'static str,
        getter: G,
        setter: S,
        flags: OptionFlags,
        doc: &'static str,
    ) -> Result<(), ObjectError>
    where
        G: Fn(&T) -> OptionValue + Send + Sync + 'static,
        S: Fn(&mut T, &OptionValue) -> Result<(), String> + Send + Sync + 'static,
    {
        if self.find(name).is_some() {
            return Err(ObjectError::DuplicateOption {
                class: self.class_name.to_string(),
                name: name.to_string(),
            });
        }
        self.options.push(OptionDescriptor {
            name,
            getter: Arc::new(getter),
            setter: Arc::new(setter),
            flags,
            doc,
        });
        Ok(())
    }

    /// 继承父部件的全部选项：`up`/`up_mut`从本类型取到父部件。
    /// 须在声明本类型自己的选项之前调用，枚举顺序总是“基类在前”
    pub fn inherit<P: 'static>(
        &mut self,
        parent: &OptionRegistry<P>,
        up: fn(&T) -> &P,
        up_mut: fn(&mut T) -> &mut P,
    ) -> &mut Self {
        if let Err(e) = self.try_inherit(parent, up, up_mut) {
            panic!("{e}");
        }
        self
    }

    pub fn try_inherit<P: 'static>(
        &mut self,
        parent: &OptionRegistry<P>,
        up: fn(&T) -> &P,
        up_mut: fn(&mut T) -> &mut P,
    ) -> Result<&mut Self, ObjectError> {
        for desc in &parent.options {
            let getter = Arc::clone(&desc.getter);
            let setter = Arc::clone(&desc.setter);
            self.try_declare_with(
                desc.name,
                move |obj: &T| getter(up(obj)),
                move |obj: &mut T, value: &OptionValue| setter(up_mut(obj), value),
                desc.flags,
                desc.doc,
            )?;
        }
        Ok(self)
    }

    pub fn find(&self, name: &str) -> Option<&OptionDescriptor<T>> {
        self.options.iter().find(|d| d.name == name)
    }

    fn find_or_err(&self, name: &str) -> Result<&OptionDescriptor<T>, ObjectError> {
        self.find(name).ok_or_else(|| ObjectError::UnknownOption {
            class: self.class_name.to_string(),
            name: name.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionDescriptor<T>> {
        self.options.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.options.iter().map(|d| d.name).collect()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn get_value(&self, obj: &T, name: &str) -> Result<OptionValue, ObjectError> {
        Ok(self.find_or_err(name)?.get(obj))
    }

    /// 以文本形式读取选项值
    pub fn get(&self, obj: &T, name: &str) -> Result<String, ObjectError> {
        Ok(dialect::write_value(&self.get_value(obj, name)?))
    }

    pub fn set_value(&self, obj: &mut T, name: &str, value: &OptionValue) -> Result<(), ObjectError> {
        let desc = self.find_or_err(name)?;
        desc.set(obj, value).map_err(|reason| ObjectError::BadOptionValue {
            class: self.class_name.to_string(),
            name: name.to_string(),
            value: dialect::write_value(value),
            reason,
        })
    }

    /// 以文本形式设置选项值；文本无法解析或无法转换时返回`BadOptionValue`
    pub fn set(&self, obj: &mut T, name: &str, text: &str) -> Result<(), ObjectError> {
        self.find_or_err(name)?;
        let value = dialect::parse_value(text).map_err(|e| ObjectError::BadOptionValue {
            class: self.class_name.to_string(),
            name: name.to_string(),
            value: text.to_string(),
            reason: e.to_string(),
        })?;
        self.set_value(obj, name, &value)
    }
}

/// 声明一个直接绑定到`Self`同名字段的选项
///
/// ```ignore
/// declare_option!(reg, Self, nhidden, OptionFlags::BUILD, "隐藏层单元数");
/// ```
#[macro_export]
macro_rules! declare_option {
    ($registry:expr, $ty:ty, $field:ident, $flags:expr, $doc:expr) => {
        $registry.declare_option(
            stringify!($field),
            |obj: &$ty| &obj.$field,
            |obj: &mut $ty| &mut obj.$field,
            $flags,
            $doc,
        )
    };
}
