pub mod resource_locker;
