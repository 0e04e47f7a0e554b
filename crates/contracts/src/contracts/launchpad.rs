crate::sol! {
    /// Safe7579 launchpad.
    ///
    /// In launchpad mode the proxy initially points at the launchpad, and deployment
    /// only commits to the hash of the eventual Safe configuration. The first user
    /// operation validates against that hash, upgrades the proxy to the Safe singleton,
    /// runs `setup` and installs the ERC-7579 modules.
    #[derive(Debug, PartialEq, Eq)]
    interface ISafe7579Launchpad {
        struct ModuleInit {
            address module;
            bytes initData;
        }

        /// Stores `initHash` and optionally delegatecalls `to` with `preInit`.
        function preValidationSetup(bytes32 initHash, address to, bytes calldata preInit) external;

        /// Setup data executed by the launchpad after the singleton switch.
        function initSafe7579(
            address safe7579,
            ModuleInit[] calldata executors,
            ModuleInit[] calldata fallbacks,
            ModuleInit[] calldata hooks,
            address[] calldata attesters,
            uint8 threshold
        ) external;
    }
}

pub use ISafe7579Launchpad::ModuleInit;
