pub mod action_key;
pub mod bay_status;
pub mod dispatcher;
pub mod notifier;
pub mod poller;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_support;
