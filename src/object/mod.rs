/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 对象模型：可按名字配置的选项、两阶段构建（先设选项，再build）、
 *                 文本序列化/反序列化，以及基于句柄的深拷贝。
 *                 学习器、优化器、统计收集器等都通过实现`Object`接入这套机制。
 */

mod arena;
pub mod dialect;
mod error;
mod option;
mod value;

#[cfg(test)]
mod tests;

pub use arena::{Arena, CopyMap, Handle, Relink};
pub use error::ObjectError;
pub use option::{OptionDescriptor, OptionFlags, OptionRegistry};
pub use value::{ObjectSpec, OptionType, OptionValue};

/// 对象的构建状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildState {
    /// 刚构造，尚未build
    #[default]
    Unbuilt,
    /// 已build，派生状态与选项一致
    Built,
    /// build之后又修改过选项，需要重新build
    Stale,
}

/// 可配置对象。每个实现类型持有一张静态的选项表（见`registry`）
pub trait Object: Sized + 'static {
    type Error: From<ObjectError>;

    fn registry() -> &'static OptionRegistry<Self>;

    fn build_state(&self) -> BuildState;
    fn set_build_state(&mut self, state: BuildState);

    /// 由当前选项推导出派生状态。多次调用必须是幂等的
    fn build_(&mut self) -> Result<(), Self::Error>;

    fn build(&mut self) -> Result<(), Self::Error> {
        self.build_()?;
        self.set_build_state(BuildState::Built);
        Ok(())
    }

    /// 非设置类方法的前置检查
    fn ensure_built(&self) -> Result<(), ObjectError> {
        match self.build_state() {
            BuildState::Built => Ok(()),
            _ => Err(ObjectError::NotBuilt(Self::registry().class_name().to_string())),
        }
    }

    /// 是否已有学到的状态；为真时序列化会包含LEARNT选项
    fn has_learnt_state(&self) -> bool {
        false
    }
}

pub fn class_name_of<T: Object>() -> &'static str {
    T::registry().class_name()
}

pub fn get_option<T: Object>(obj: &T, name: &str) -> Result<String, ObjectError> {
    T::registry().get(obj, name)
}

pub fn get_option_value<T: Object>(obj: &T, name: &str) -> Result<OptionValue, ObjectError> {
    T::registry().get_value(obj, name)
}

fn mark_stale<T: Object>(obj: &mut T) {
    if obj.build_state() == BuildState::Built {
        obj.set_build_state(BuildState::Stale);
    }
}

/// 按文本设置单个选项；已build的对象会被标记为需要重新build
pub fn set_option<T: Object>(obj: &mut T, name: &str, text: &str) -> Result<(), ObjectError> {
    T::registry().set(obj, name, text)?;
    mark_stale(obj);
    Ok(())
}

pub fn set_option_value<T: Object>(
    obj: &mut T,
    name: &str,
    value: &OptionValue,
) -> Result<(), ObjectError> {
    T::registry().set_value(obj, name, value)?;
    mark_stale(obj);
    Ok(())
}

/// 依次设置若干选项后重新build
pub fn change_options<T: Object>(obj: &mut T, options: &[(&str, &str)]) -> Result<(), T::Error> {
    for (name, text) in options {
        set_option(obj, name, text)?;
    }
    obj.build()
}

/// 生成对象的描述：跳过NOSAVE/DEPRECATED选项；LEARNT选项只在对象已有学到的状态时输出
pub fn to_spec<T: Object>(obj: &T) -> ObjectSpec {
    let include_learnt = obj.has_learnt_state();
    let registry = T::registry();
    ObjectSpec {
        class_name: registry.class_name().to_string(),
        options: registry
            .iter()
            .filter(|d| d.flags().is_saved(include_learnt))
            .map(|d| (d.name().to_string(), d.get(obj)))
            .collect(),
    }
}

/// 由描述重建对象：先设置非LEARNT选项并build，再写回LEARNT选项
pub fn from_spec<T: Object + Default>(spec: &ObjectSpec) -> Result<T, T::Error> {
    let registry = T::registry();
    if spec.class_name != registry.class_name() {
        return Err(ObjectError::TypeMismatch {
            expected: registry.class_name().to_string(),
            got: spec.class_name.clone(),
        }
        .into());
    }

    let mut obj = T::default();
    let mut learnt = Vec::new();
    for (name, value) in &spec.options {
        let desc = registry.find(name).ok_or_else(|| ObjectError::UnknownOption {
            class: registry.class_name().to_string(),
            name: name.clone(),
        })?;
        if desc.flags().contains(OptionFlags::LEARNT) {
            learnt.push((name.as_str(), value));
        } else {
            registry.set_value(&mut obj, name, value)?;
        }
    }
    obj.build()?;
    for (name, value) in learnt {
        registry.set_value(&mut obj, name, value)?;
    }
    Ok(obj)
}

pub fn serialize<T: Object>(obj: &T) -> String {
    dialect::write_object(&to_spec(obj))
}

pub fn parse<T: Object + Default>(text: &str) -> Result<T, T::Error> {
    let spec = dialect::parse_object(text)?;
    from_spec(&spec)
}
