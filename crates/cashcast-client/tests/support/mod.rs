pub mod ledger_testkit;
