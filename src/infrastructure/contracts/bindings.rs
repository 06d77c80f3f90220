//! Typed bindings for the deployed audit contracts
//!
//! Mirrors `abi/*.json`; `conformance::check_tables` keeps the two in sync.

use alloy_sol_types::sol;

sol! {
    interface ISEAuditContract {
        struct AuditSeed {
            string ownerName;
            address owner;
            string auditTitle;
            uint256 uploadDate;
            uint256 maxAuditWindow;
            uint256 auditStart;
            uint256 auditDate;
            uint256 publishDate;
            uint256 expires;
            address auditor;
            string auditorName;
            uint256 carbonOffSet;
        }

        struct AuditUri {
            string uri;
            string label;
            bool isPrivate;
        }

        function bookForAudit(string memory _auditorName) external returns (bool _booked);
        function getAuditReport() external view returns (string memory _auditReportUri, uint8 _declaration);
        function getAuditSeed() external view returns (AuditSeed memory _seed);
        function getEstimatedAuditEndTime() external view returns (uint256 _auditEndTime);
        function getName() external pure returns (string memory _name);
        function getProofs(uint8 _proof) external view returns (address _erc1155, uint256 _nftId);
        function getPublicData() external view returns (AuditUri[] memory _publicAuditUris);
        function getStatus() external view returns (string memory _status);
        function getUrisToAudit() external view returns (AuditUri[] memory _auditUris, string memory _notesUri);
        function getVersion() external pure returns (uint256 _version);
        function makePublic() external returns (bool _done);
        function onERC1155BatchReceived(address operator, address from, uint256[] calldata ids, uint256[] calldata values, bytes calldata data) external returns (bytes4);
        function onERC1155Received(address operator, address from, uint256 id, uint256 value, bytes calldata data) external returns (bytes4);
        function submitAuditReport(string memory _auditReportUri, uint8 _declaration, string memory _auditorSealUri, string memory _auditSubmissionManifestUri) external returns (bool _submitted);
        function supportsInterface(bytes4 interfaceId) external view returns (bool);
        function withdraw() external returns (bool _withdrawn);
    }

    interface ISEAuditManager {
        function getAuditContractsWithStatus(string memory _status) external view returns (address[] memory _auditContracts);
        function getContractsUnderAuditor(address _auditor) external view returns (address[] memory _auditContracts);
        function getPublicAuditContracts() external view returns (address[] memory _auditContracts);
        function getPublicAuditContractsForUser(address _user) external view returns (address[] memory _auditContracts);
        function getUserAuditContracts() external view returns (address[] memory _auditContracts);
        function uploadFiles(string memory _ownerName, string memory _auditTitle, uint256 _maxAuditWindow, uint256 _carbonOffset, string[] memory _urisToAudit, string[] memory _uriLabels, bool[] memory _private, string memory _notesUri, string memory _uploadManifestUri) external returns (address _auditContract);
    }

    interface ISERegistry {
        function getAddress(string memory _name) external view returns (address _address);
    }
}

/// Selector of every binding method, with its read-only flag, per table
pub(crate) fn audit_contract_methods() -> Vec<(&'static str, [u8; 4], bool)> {
    use alloy_sol_types::SolCall;
    use ISEAuditContract::*;
    vec![
        (bookForAuditCall::SIGNATURE, bookForAuditCall::SELECTOR, false),
        (getAuditReportCall::SIGNATURE, getAuditReportCall::SELECTOR, true),
        (getAuditSeedCall::SIGNATURE, getAuditSeedCall::SELECTOR, true),
        (
            getEstimatedAuditEndTimeCall::SIGNATURE,
            getEstimatedAuditEndTimeCall::SELECTOR,
            true,
        ),
        (getNameCall::SIGNATURE, getNameCall::SELECTOR, true),
        (getProofsCall::SIGNATURE, getProofsCall::SELECTOR, true),
        (getPublicDataCall::SIGNATURE, getPublicDataCall::SELECTOR, true),
        (getStatusCall::SIGNATURE, getStatusCall::SELECTOR, true),
        (getUrisToAuditCall::SIGNATURE, getUrisToAuditCall::SELECTOR, true),
        (getVersionCall::SIGNATURE, getVersionCall::SELECTOR, true),
        (makePublicCall::SIGNATURE, makePublicCall::SELECTOR, false),
        (
            onERC1155BatchReceivedCall::SIGNATURE,
            onERC1155BatchReceivedCall::SELECTOR,
            false,
        ),
        (
            onERC1155ReceivedCall::SIGNATURE,
            onERC1155ReceivedCall::SELECTOR,
            false,
        ),
        (
            submitAuditReportCall::SIGNATURE,
            submitAuditReportCall::SELECTOR,
            false,
        ),
        (
            supportsInterfaceCall::SIGNATURE,
            supportsInterfaceCall::SELECTOR,
            true,
        ),
        (withdrawCall::SIGNATURE, withdrawCall::SELECTOR, false),
    ]
}

pub(crate) fn audit_manager_methods() -> Vec<(&'static str, [u8; 4], bool)> {
    use alloy_sol_types::SolCall;
    use ISEAuditManager::*;
    vec![
        (
            getAuditContractsWithStatusCall::SIGNATURE,
            getAuditContractsWithStatusCall::SELECTOR,
            true,
        ),
        (
            getContractsUnderAuditorCall::SIGNATURE,
            getContractsUnderAuditorCall::SELECTOR,
            true,
        ),
        (
            getPublicAuditContractsCall::SIGNATURE,
            getPublicAuditContractsCall::SELECTOR,
            true,
        ),
        (
            getPublicAuditContractsForUserCall::SIGNATURE,
            getPublicAuditContractsForUserCall::SELECTOR,
            true,
        ),
        (
            getUserAuditContractsCall::SIGNATURE,
            getUserAuditContractsCall::SELECTOR,
            true,
        ),
        (uploadFilesCall::SIGNATURE, uploadFilesCall::SELECTOR, false),
    ]
}

pub(crate) fn registry_methods() -> Vec<(&'static str, [u8; 4], bool)> {
    use alloy_sol_types::SolCall;
    vec![(
        ISERegistry::getAddressCall::SIGNATURE,
        ISERegistry::getAddressCall::SELECTOR,
        true,
    )]
}
