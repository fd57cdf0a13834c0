//! Bindings of the rbank smart contracts.
//!
//! Only the ABI is embedded; deployable bytecode is loaded at runtime from
//! the contracts' build output, see [`Artifact`].

use alloy::primitives::Bytes;
use serde::Deserialize;

use crate::error::RbankError;

alloy::sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    contract Controller {
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

        function MANTISSA() external view returns (uint256);
        function deployBlock() external view returns (uint256);
        function owner() external view returns (address);
        function collateralFactor() external view returns (uint256);
        function liquidationFactor() external view returns (uint256);
        function marketListSize() external view returns (uint256);
        function marketList(uint256 index) external view returns (address);
        function marketsByToken(address token) external view returns (address);
        function prices(address market) external view returns (uint256);
        function getAccountValues(address account) external view returns (uint256 supplyValue, uint256 borrowValue);
        function getAccountLiquidity(address account) external view returns (uint256);
        function getAccountHealth(address account) external view returns (int256);

        function setCollateralFactor(uint256 factor) external;
        function setLiquidationFactor(uint256 factor) external;
        function addMarket(address market) external;
        function setPrice(address market, uint256 price) external;
    }
}

alloy::sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    contract Market {
        event Supply(address indexed user, uint256 amount);
        event Borrow(address indexed user, uint256 amount);
        event Redeem(address indexed user, uint256 amount);
        event PayBorrow(address indexed user, uint256 amount);

        constructor(address token, uint256 baseBorrowRate);

        function token() external view returns (address);
        function controller() external view returns (address);
        function deployBlock() external view returns (uint256);
        function baseBorrowRate() external view returns (uint256);
        function getCash() external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function totalBorrows() external view returns (uint256);
        function supplyOf(address user) external view returns (uint256);
        function borrowBy(address user) external view returns (uint256);

        function setController(address controller) external;
        function supply(uint256 amount) external;
        function borrow(uint256 amount) external;
        function redeem(uint256 amount) external;
        function payBorrow(uint256 amount) external;
    }
}

alloy::sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    contract Token {
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);

        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 value) external returns (bool);
    }
}

/// Compiled contract as emitted by the contracts build
/// (`build/contracts/<Name>.json`).
#[derive(Clone, Debug, Deserialize)]
pub struct Artifact {
    #[serde(rename = "contractName", default)]
    pub contract_name: Option<String>,
    pub bytecode: Bytes,
}

impl Artifact {
    pub fn from_json(json: &str) -> Result<Self, RbankError> {
        let artifact: Artifact = serde_json::from_str(json)?;
        if artifact.bytecode.is_empty() {
            return Err(RbankError::InvalidArgument(format!(
                "artifact {} has no bytecode",
                artifact.contract_name.as_deref().unwrap_or("<unnamed>")
            )));
        }
        Ok(artifact)
    }
}
