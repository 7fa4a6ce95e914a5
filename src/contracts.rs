//! ROSCA contract ABI definitions
//!
//! Uses alloy's sol! macro to generate type-safe bindings. The contract is
//! externally deployed; this client only consumes the surface below.
//!
//! Deployment takes constructor args `(uint256 numberOfParticipants,
//! uint256 totalAmountWei)` with an initial value transfer of one
//! contribution share; the deploy transaction is assembled in `writer`
//! from the compiled bytecode artifact.

use alloy::sol;

sol! {
    /// ROSCA (rotating savings and credit association) contract interface
    #[sol(rpc)]
    contract Rosca {
        // ====================================================================
        // View Functions
        // ====================================================================

        /// Total pool amount in wei
        function totalAmount() external view returns (uint256);

        /// Per-participant contribution share in wei
        function contributionAmount() external view returns (uint256);

        /// Participant capacity
        function totalParticipants() external view returns (uint256);

        /// Index of the current round
        function currentRound() external view returns (uint256);

        /// Snapshot of the current round
        function getCurrentRoundStatus() external view returns (
            uint256 roundNumber,
            address recipient,
            uint256 totalContributed,
            uint256 targetAmount,
            bool isDistributed
        );

        /// Participant address at a join-order index.
        /// Reverts for unfilled slots.
        function participantList(uint256 index) external view returns (address);

        /// Whether an address has contributed this round
        function hasContributed(address participant) external view returns (bool);

        /// Round record at an index (public mapping getter)
        function rounds(uint256 index) external view returns (
            address recipient,
            bool isDistributed
        );

        // ====================================================================
        // State-Changing Functions (all payable)
        // ====================================================================

        /// Join the ROSCA, paying the first contribution share
        function registerParticipant() external payable;

        /// Pay this round's contribution share
        function contribute() external payable;

        /// Distribute the round's pool to its recipient
        function distributePool() external payable;

        // ====================================================================
        // Events
        // ====================================================================

        /// Emitted when a participant joins; used for membership discovery
        event ParticipantRegistered(address indexed participant);
    }
}
