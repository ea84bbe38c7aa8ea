pub mod u001_sync_uzum;
