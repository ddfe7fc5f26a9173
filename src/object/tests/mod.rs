mod arena;

use crate::object::{BuildState, Object, ObjectError, OptionFlags, OptionRegistry};
use std::sync::OnceLock;

/// 测试用的小对象：一个构建期选项、一个列表选项、一个不保存的选项和一个学到的值
#[derive(Debug, Default, Clone, PartialEq)]
pub(super) struct Toy {
    pub size: usize,
    pub rate: f64,
    pub names: Vec<String>,
    pub verbose: bool,
    pub weights: Vec<f64>,
    pub build_count: usize,
    state: BuildState,
}

impl Object for Toy {
    type Error = ObjectError;

    fn registry() -> &'static OptionRegistry<Self> {
        static REGISTRY: OnceLock<OptionRegistry<Toy>> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let mut reg = OptionRegistry::new("Toy");
            crate::declare_option!(reg, Toy, size, OptionFlags::BUILD, "大小");
            crate::declare_option!(reg, Toy, rate, OptionFlags::BUILD, "速率");
            crate::declare_option!(reg, Toy, names, OptionFlags::BUILD, "名字列表");
            crate::declare_option!(reg, Toy, verbose, OptionFlags::NOSAVE, "是否输出详细信息");
            crate::declare_option!(reg, Toy, weights, OptionFlags::LEARNT, "学到的权重");
            reg
        })
    }

    fn build_state(&self) -> BuildState {
        self.state
    }

    fn set_build_state(&mut self, state: BuildState) {
        self.state = state;
    }

    fn build_(&mut self) -> Result<(), ObjectError> {
        if self.weights.len() != self.size {
            self.weights = vec![0.0; self.size];
        }
        self.build_count += 1;
        Ok(())
    }

    fn has_learnt_state(&self) -> bool {
        self.weights.iter().any(|&w| w != 0.0)
    }
}

/// 通过`inherit`复用`Toy`全部选项的派生对象
#[derive(Debug, Default)]
pub(super) struct DerivedToy {
    pub base: Toy,
    pub extra: i64,
}

impl DerivedToy {
    pub(super) fn registry() -> &'static OptionRegistry<DerivedToy> {
        static REGISTRY: OnceLock<OptionRegistry<DerivedToy>> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let mut reg = OptionRegistry::<DerivedToy>::new("DerivedToy");
            reg.inherit(Toy::registry(), |d| &d.base, |d| &mut d.base);
            crate::declare_option!(reg, DerivedToy, extra, OptionFlags::BUILD, "额外选项");
            reg
        })
    }
}
