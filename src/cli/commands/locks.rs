use anyhow::Result;
use chrono::{DateTime, Utc};

use super::{connect, Command};
use crate::api::types::{Lock, LockFilters, LockType};
use crate::api::{delete_manual_lock, new_lock_request, update_manual_lock};
use crate::config::FluxConfig;
use crate::lock_view::{describe_timeout, filter_locks, LockView};

pub struct LockSearchCommand {
    config: FluxConfig,
    name: Option<String>,
    view: LockView,
    page: u32,
}

impl LockSearchCommand {
    pub fn new(config: FluxConfig, name: Option<String>, view: LockView, page: u32) -> Self {
        Self {
            config,
            name,
            view,
            page: page.max(1),
        }
    }
}

impl Command for LockSearchCommand {
    async fn execute(&self) -> Result<()> {
        let services = connect(&self.config).await?;
        let filters = LockFilters {
            lock_name: self.name.clone(),
            page_number: self.page,
            ..LockFilters::default()
        };

        let locks = match services.locks.search(&filters).await {
            Ok(locks) => locks,
            Err(e) => {
                println!("❌ Failed to search locks: {}", e.user_message());
                return Err(e.into());
            }
        };
        let page_full = locks.len() as u32 == filters.page_size;

        let now = Utc::now();
        let locks = filter_locks(locks, self.view, now);
        if locks.is_empty() {
            println!("🔒 No locks found on page {}", self.page);
            return Ok(());
        }

        println!();
        println!("🔒 LOCKS (page {}):", self.page);
        println!("────────────────────");
        for lock in &locks {
            print_lock_line(lock, now);
        }

        if page_full {
            println!();
            println!("💡 More locks available: --page {}", self.page + 1);
        }
        Ok(())
    }
}

fn print_lock_line(lock: &Lock, now: chrono::DateTime<Utc>) {
    let status = match lock.timeout {
        Some(timeout) if lock.is_timer() => format!("⏱️  {}", describe_timeout(timeout, now)),
        _ => "🔐 manual".to_string(),
    };
    println!("  {} {}  {}", lock.lock_id, lock.name, status);
}

pub struct LockShowCommand {
    config: FluxConfig,
    lock_id: String,
}

impl LockShowCommand {
    pub fn new(config: FluxConfig, lock_id: String) -> Self {
        Self { config, lock_id }
    }
}

impl Command for LockShowCommand {
    async fn execute(&self) -> Result<()> {
        let services = connect(&self.config).await?;
        let lock = match services.locks.get_by_id(&self.lock_id).await {
            Ok(lock) => lock,
            Err(e) => {
                println!("❌ Failed to load lock {}: {}", self.lock_id, e.user_message());
                return Err(e.into());
            }
        };

        println!();
        println!("🔒 {}", lock.name);
        println!("   🆔 ID: {}", lock.lock_id);
        println!("   🏷️  Type: {}", lock.lock_type);
        println!("   👤 Created by: {}", lock.created_by);
        if let Some(created_at) = lock.created_at {
            println!("   📅 Created: {}", created_at.to_rfc3339());
        }
        if let Some(timeout) = lock.timeout {
            println!(
                "   ⏱️  Timeout: {} ({})",
                timeout.to_rfc3339(),
                describe_timeout(timeout, Utc::now())
            );
        }
        if !lock.description.is_empty() {
            println!("   📄 {}", lock.description);
        }
        Ok(())
    }
}

pub struct LockDeleteCommand {
    config: FluxConfig,
    lock_id: String,
}

impl LockDeleteCommand {
    pub fn new(config: FluxConfig, lock_id: String) -> Self {
        Self { config, lock_id }
    }
}

impl Command for LockDeleteCommand {
    async fn execute(&self) -> Result<()> {
        let services = connect(&self.config).await?;
        match delete_manual_lock(services.locks.as_ref(), &self.lock_id).await {
            Ok(lock) => {
                println!("🗑️  Deleted lock '{}' ({})", lock.name, lock.lock_id);
                println!("   🔓 Everything it guarded is now unlocked");
                Ok(())
            }
            Err(e) => {
                println!("❌ {}", e.user_message());
                Err(e.into())
            }
        }
    }
}

pub struct LockCreateCommand {
    config: FluxConfig,
    name: String,
    description: String,
    lock_type: LockType,
    timeout: Option<DateTime<Utc>>,
}

impl LockCreateCommand {
    pub fn new(
        config: FluxConfig,
        name: String,
        description: String,
        lock_type: LockType,
        timeout: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            config,
            name,
            description,
            lock_type,
            timeout,
        }
    }
}

impl Command for LockCreateCommand {
    async fn execute(&self) -> Result<()> {
        let request = match new_lock_request(
            &self.name,
            &self.description,
            self.lock_type,
            self.timeout,
            Utc::now(),
        ) {
            Ok(request) => request,
            Err(e) => {
                println!("❌ {}", e.user_message());
                return Err(e.into());
            }
        };

        let services = connect(&self.config).await?;
        match services.locks.create(&request).await {
            Ok(lock) => {
                println!("🔒 Created {} lock '{}' ({})", lock.lock_type, lock.name, lock.lock_id);
                if let Some(timeout) = lock.timeout {
                    println!("   ⏱️  {}", describe_timeout(timeout, Utc::now()));
                }
                Ok(())
            }
            Err(e) => {
                println!("❌ Failed to create lock: {}", e.user_message());
                Err(e.into())
            }
        }
    }
}

pub struct LockUpdateCommand {
    config: FluxConfig,
    lock_id: String,
    name: Option<String>,
    description: Option<String>,
}

impl LockUpdateCommand {
    pub fn new(
        config: FluxConfig,
        lock_id: String,
        name: Option<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            config,
            lock_id,
            name,
            description,
        }
    }
}

impl Command for LockUpdateCommand {
    async fn execute(&self) -> Result<()> {
        if self.name.is_none() && self.description.is_none() {
            println!("💡 Nothing to change: pass --name and/or --description");
            return Ok(());
        }

        let services = connect(&self.config).await?;
        match update_manual_lock(
            services.locks.as_ref(),
            &self.lock_id,
            self.name.clone(),
            self.description.clone(),
        )
        .await
        {
            Ok(lock) => {
                println!("✏️  Updated lock '{}' ({})", lock.name, lock.lock_id);
                Ok(())
            }
            Err(e) => {
                println!("❌ {}", e.user_message());
                Err(e.into())
            }
        }
    }
}
