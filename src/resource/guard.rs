//! 资源列表保护
//!
//! 资源列表以不可变快照的形式保存，更新时整体替换。
//! 锁只在替换或克隆快照句柄期间持有，不会跨越任何网络IO。

use crate::resource::descriptor::ResourceDescriptor;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// 资源列表的不可变快照
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceSnapshot {
    /// 快照版本号，每次更新递增
    pub version: u64,
    /// 资源列表，`index` 与位置一致
    pub resources: Vec<ResourceDescriptor>,
}

impl ResourceSnapshot {
    /// 资源数量
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// 是否为空列表
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// 按位置获取资源
    pub fn get(&self, index: usize) -> Option<&ResourceDescriptor> {
        self.resources.get(index)
    }
}

/// 资源列表保护器
///
/// 周期性读取方通过 [`ResourceListGuard::snapshot`] 获取完整快照，
/// 外部写入方通过 [`ResourceListGuard::update`] 原子地安装新列表。
#[derive(Debug, Default)]
pub struct ResourceListGuard {
    current: RwLock<Arc<ResourceSnapshot>>,
}

impl ResourceListGuard {
    /// 创建新的资源列表保护器
    ///
    /// # 参数
    /// * `resources` - 初始资源列表（可以为空）
    ///
    /// # 返回
    /// * `Self` - 保护器实例
    pub fn new(resources: Vec<ResourceDescriptor>) -> Self {
        Self {
            current: RwLock::new(Arc::new(ResourceSnapshot {
                version: 0,
                resources: Self::reindex(resources),
            })),
        }
    }

    /// 整体替换资源列表
    ///
    /// # 参数
    /// * `resources` - 新的资源列表
    ///
    /// # 返回
    /// * `u64` - 新快照的版本号
    pub fn update(&self, resources: Vec<ResourceDescriptor>) -> u64 {
        // 重新编号在加锁前完成
        let resources = Self::reindex(resources);
        let count = resources.len();

        let version = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            let version = current.version + 1;
            *current = Arc::new(ResourceSnapshot { version, resources });
            version
        };

        info!("资源列表已更新，版本: {}, 资源数量: {}", version, count);
        version
    }

    /// 获取当前资源列表的快照
    pub fn snapshot(&self) -> Arc<ResourceSnapshot> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    /// 当前快照版本号
    pub fn version(&self) -> u64 {
        self.snapshot().version
    }

    /// 当前资源数量
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// 当前列表是否为空
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// 使每个资源的 `index` 等于其在列表中的位置
    fn reindex(mut resources: Vec<ResourceDescriptor>) -> Vec<ResourceDescriptor> {
        for (position, resource) in resources.iter_mut().enumerate() {
            if resource.index != position {
                debug!(
                    "资源位置已重新编号: {} {} -> {}",
                    resource.url, resource.index, position
                );
                resource.index = position;
            }
        }
        resources
    }
}
